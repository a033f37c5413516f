//! Display-ready transformations of backend payloads.
//!
//! All functions here are pure apart from the placeholder acceptance rate,
//! whose randomness comes from an injected [`RandomSource`].

pub mod behavior;
pub mod loans;
pub mod random;

pub use behavior::{
    category_label, BehaviorView, CategoryBreakdown, CategoryRow, DistributionSlice, Rating, Tone,
    MAX_BEHAVIOR_SCORE,
};
pub use loans::{AcceptanceRate, CachedLoan, LoanBook, LoanSummary};
pub use random::{RandomSource, ThreadRandom};
