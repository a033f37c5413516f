use tracing::debug;

use crate::api::{ApiClient, ApiError, OutboundRequest};
use crate::models::{LoanApplication, LoanRecord};

/// `/api/loans/*`.
#[derive(Clone)]
pub struct LoanGateway {
    client: ApiClient,
}

impl LoanGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Submit an application. The returned record may lack `acceptance_rate`.
    pub async fn apply(&self, application: &LoanApplication) -> Result<LoanRecord, ApiError> {
        let request = OutboundRequest::post("/api/loans/apply").json(application)?;
        let record: LoanRecord = self.client.send(request).await?;
        debug!(loan_id = ?record.id, has_rate = record.acceptance_rate.is_some(), "Loan application submitted");
        Ok(record)
    }

    pub async fn user_loans(&self, user_id: &str) -> Result<Vec<LoanRecord>, ApiError> {
        self.client
            .send(OutboundRequest::get("/api/loans/user").segment(user_id))
            .await
    }

    pub async fn loan(&self, loan_id: &str) -> Result<LoanRecord, ApiError> {
        self.client
            .send(OutboundRequest::get("/api/loans").segment(loan_id))
            .await
    }
}
