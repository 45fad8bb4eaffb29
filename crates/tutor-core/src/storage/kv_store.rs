//! Key-value store trait.
//!
//! The tutor persists two kinds of values: the API credential and one JSON
//! conversation log per topic. Implementations live in tutor-infra.

use tutor_types::error::RepositoryError;

/// Fixed key of the stored API credential.
pub const CREDENTIAL_KEY: &str = "gemini_api_key";

/// Trait for string-valued persistent storage.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait KvStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a key. No-op if key does not exist.
    fn remove(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
