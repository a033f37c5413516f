use crate::api::{ApiClient, ApiError, OutboundRequest};
use crate::models::Bank;

/// Page size the front-end uses for the top and trusted lists.
pub const DEFAULT_BANK_LIMIT: u32 = 10;

/// `/api/banks/*`.
#[derive(Clone)]
pub struct BankGateway {
    client: ApiClient,
}

impl BankGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn all(&self) -> Result<Vec<Bank>, ApiError> {
        self.client.send(OutboundRequest::get("/api/banks/")).await
    }

    pub async fn top(&self, limit: u32) -> Result<Vec<Bank>, ApiError> {
        self.client
            .send(OutboundRequest::get("/api/banks/top").query("limit", limit))
            .await
    }

    pub async fn trusted(&self, limit: u32) -> Result<Vec<Bank>, ApiError> {
        self.client
            .send(OutboundRequest::get("/api/banks/trusted").query("limit", limit))
            .await
    }
}
