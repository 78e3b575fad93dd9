use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

pub mod api;
pub mod classify;
pub mod config;
pub mod controller;
pub mod credential_store;
pub mod error;
pub mod navigation;
pub mod resources;
pub mod screen;
pub mod session;
pub mod validation;

pub use api::{Endpoint, MarketplaceApi, MarketplaceClient};
pub use config::{load_settings, Settings};
pub use controller::{ClientContext, FetchController, LoadOutcome, Resource, ViewState};
pub use credential_store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ClientError, StoreError, ValidationError};
pub use navigation::{ClientEvent, Navigator, Route};
pub use screen::Screen;
pub use session::SessionContext;

impl ClientContext {
    /// Wires the HTTP client and the on-disk credential store described by
    /// `settings`, restoring any persisted session.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let api = MarketplaceClient::from_settings(settings)?;
        let credential_path = settings.resolved_credential_path()?;
        let store = Arc::new(FileCredentialStore::new(credential_path.clone()));
        let session = SessionContext::restore(store)
            .await
            .with_context(|| format!("failed to restore session from {}", credential_path.display()))?;
        info!(api = %api.base_url(), "marketplace client ready");

        Ok(Self {
            api: Arc::new(api),
            session: Arc::new(session),
            navigator: Navigator::new(),
            booking_redirect_delay: settings.booking_redirect_delay,
        })
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
