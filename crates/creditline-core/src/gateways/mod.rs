//! Typed gateways, one per backend resource family.
//!
//! Each method builds an `OutboundRequest`, sends it through the shared
//! `ApiClient` and returns the decoded payload. Errors pass through exactly
//! as the client classified them.

pub mod auth;
pub mod banks;
pub mod loans;
pub mod transactions;

pub use auth::AuthGateway;
pub use banks::{BankGateway, DEFAULT_BANK_LIMIT};
pub use loans::LoanGateway;
pub use transactions::{TransactionFile, TransactionGateway};
