use std::path::Path;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};

use crate::api::{ApiClient, ApiError, OutboundRequest};
use crate::models::BehaviorPayload;

/// A bank statement to upload.
#[derive(Debug, Clone)]
pub struct TransactionFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl TransactionFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read statement file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match extension.as_deref() {
            Some("csv") => "text/csv",
            Some("pdf") => "application/pdf",
            Some("xls") => "application/vnd.ms-excel",
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some("json") => "application/json",
            _ => "application/octet-stream",
        }
    }
}

/// `/api/transactions/*`.
#[derive(Clone)]
pub struct TransactionGateway {
    client: ApiClient,
}

impl TransactionGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload a statement for analysis (multipart fields `file` and `monthly_income`).
    pub async fn upload(
        &self,
        file: TransactionFile,
        monthly_income: f64,
    ) -> Result<BehaviorPayload, ApiError> {
        let mime = file.mime_type();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(mime)
            .map_err(ApiError::from_transport)?;
        let form = Form::new()
            .part("file", part)
            .text("monthly_income", monthly_income.to_string());

        self.client
            .send(OutboundRequest::post("/api/transactions/upload").multipart(form))
            .await
    }

    pub async fn analyze(&self, user_id: &str) -> Result<BehaviorPayload, ApiError> {
        self.client
            .send(OutboundRequest::get("/api/transactions/analyze").segment(user_id))
            .await
    }
}
