use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use shared::domain::{Credential, CREDENTIAL_SLOT};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Durable home of the session credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<Credential>, StoreError>;
    async fn save(&self, credential: &Credential) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Credential slots kept in a JSON file readable only by the owner.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash never leaves a half-written token behind.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_slots(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Slots to rewrite on save or clear. A corrupt file is replaced; any
    /// other read failure is reported.
    async fn slots_for_update(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_slots().await {
            Err(StoreError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "credential file is corrupt; rewriting it");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    async fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let body = serde_json::to_vec_pretty(slots).map_err(|err| write_err(err.into()))?;
        let tmp_path = self.path.with_extension("tmp");

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp_path).await.map_err(write_err)?;
        file.write_all(&body).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(write_err)?;
        }

        fs::rename(&tmp_path, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, StoreError> {
        let slots = self.read_slots().await?;
        Ok(slots
            .get(CREDENTIAL_SLOT)
            .filter(|token| !token.is_empty())
            .map(|token| Credential::new(token.as_str())))
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut slots = self.slots_for_update().await?;
        slots.insert(CREDENTIAL_SLOT.to_string(), credential.expose().to_string());
        self.write_slots(&slots).await?;
        debug!(path = %self.path.display(), slot = CREDENTIAL_SLOT, "credential persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut slots = self.slots_for_update().await?;
        if slots.remove(CREDENTIAL_SLOT).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.write_slots(&slots).await?;
        debug!(path = %self.path.display(), slot = CREDENTIAL_SLOT, "credential cleared");
        Ok(())
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, StoreError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        *self.slot.lock().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/credential_store_tests.rs"]
mod tests;
