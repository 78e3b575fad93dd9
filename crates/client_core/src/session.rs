use std::sync::Arc;

use shared::domain::Credential;
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    credential_store::CredentialStore,
    error::{ClientError, StoreError},
};

/// The signed-in session shared by every screen's controller.
///
/// Sourced once from the credential store at startup; afterwards only
/// `establish` and `sign_out` write to it.
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
    current: RwLock<Option<Credential>>,
}

impl SessionContext {
    pub async fn restore(store: Arc<dyn CredentialStore>) -> Result<Self, StoreError> {
        let current = store.load().await?;
        info!(signed_in = current.is_some(), "session restored");
        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    pub fn signed_out(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    pub async fn credential(&self) -> Result<Credential, ClientError> {
        self.current
            .read()
            .await
            .clone()
            .ok_or(ClientError::MissingCredential)
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Persists `credential` and makes it the active one. The in-memory
    /// session only changes once the write succeeded.
    pub async fn establish(&self, credential: Credential) -> Result<(), StoreError> {
        self.store.save(&credential).await?;
        *self.current.write().await = Some(credential);
        info!("session established");
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), StoreError> {
        self.current.write().await.take();
        self.store.clear().await?;
        info!("session cleared");
        Ok(())
    }
}
