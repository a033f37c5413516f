use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, Session, SessionManager,
};
use crate::config::{Config, CredentialBackend};
use crate::gateways::{AuthGateway, BankGateway, LoanGateway, TransactionGateway};

/// Everything a host needs, wired around one session.
///
/// Build one per process and hand out references.
#[derive(Clone)]
pub struct AppContext {
    pub session: SessionManager,
    pub loans: LoanGateway,
    pub transactions: TransactionGateway,
    pub banks: BankGateway,
    client: ApiClient,
}

impl AppContext {
    /// Build from configuration, opening the configured credential store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn CredentialStore> = match config.credential_backend {
            CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new()),
            CredentialBackend::File => Arc::new(FileCredentialStore::new(config.data_dir()?)),
        };
        debug!(backend = ?config.credential_backend, api_url = config.api_url(), "Building context");
        Self::with_store(config.api_url(), config.timeout(), store)
    }

    pub fn with_store(
        api_url: &str,
        timeout: Duration,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let session = Arc::new(Session::open(store));
        let client = ApiClient::new(api_url, timeout, session.clone())?;

        Ok(Self {
            session: SessionManager::new(session, AuthGateway::new(client.clone())),
            loans: LoanGateway::new(client.clone()),
            transactions: TransactionGateway::new(client.clone()),
            banks: BankGateway::new(client.clone()),
            client,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
