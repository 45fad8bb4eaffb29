//! The process-wide API credential.

use secrecy::{ExposeSecret, SecretString};
use tutor_types::error::RepositoryError;

use crate::storage::kv_store::{CREDENTIAL_KEY, KvStore};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("API key is empty")]
    Empty,

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Reads and writes the credential under [`CREDENTIAL_KEY`].
pub struct CredentialStore<K: KvStore> {
    kv: K,
}

impl<K: KvStore> CredentialStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// The saved credential, if any. A stored blank value counts as none.
    pub async fn load(&self) -> Result<Option<SecretString>, RepositoryError> {
        Ok(self
            .kv
            .get(CREDENTIAL_KEY)
            .await?
            .map(|raw| raw.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(SecretString::from))
    }

    /// Trim and persist `raw`. Returns the stored secret.
    pub async fn save(&self, raw: &str) -> Result<SecretString, CredentialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }
        self.kv.set(CREDENTIAL_KEY, trimmed).await?;
        tracing::info!("API key saved");
        Ok(SecretString::from(trimmed.to_string()))
    }

    pub async fn clear(&self) -> Result<(), RepositoryError> {
        self.kv.remove(CREDENTIAL_KEY).await?;
        tracing::info!("API key removed");
        Ok(())
    }
}

/// Mask a secret for display, showing only its last 4 characters.
///
/// Values of 4 characters or fewer are fully masked.
pub fn mask_secret(secret: &SecretString) -> String {
    let value = secret.expose_secret();
    let count = value.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("****{tail}")
}
