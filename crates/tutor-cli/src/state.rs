//! Application state wiring the session controller to its infra.
//!
//! `SessionController` is generic over its key-value store and provider
//! factory; AppState pins it to SQLite and Gemini.

use std::path::PathBuf;

use anyhow::Context;

use tutor_core::chat::session::{SessionContext, SessionController};
use tutor_infra::config::{load_config, resolve_data_dir};
use tutor_infra::llm::GeminiProviderFactory;
use tutor_infra::sqlite::kv::SqliteKvStore;
use tutor_infra::sqlite::pool::{DatabasePool, database_url};

/// Controller type pinned to the concrete infra implementations.
pub type ConcreteController = SessionController<SqliteKvStore, GeminiProviderFactory>;

/// Shared application state used by every command.
pub struct AppState {
    pub controller: ConcreteController,
    pub kv: SqliteKvStore,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data dir, load config, open the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let db_url = format!("{}?mode=rwc", database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("failed to open the database")?;
        let kv = SqliteKvStore::new(db_pool);

        let factory = GeminiProviderFactory::from_config(&config);
        let controller = SessionController::new(kv.clone(), factory, config);

        tracing::debug!(data_dir = %data_dir.display(), "Application state ready");

        Ok(Self {
            controller,
            kv,
            data_dir,
        })
    }

    /// A fresh session with the saved credential restored, if any.
    pub async fn session(&self) -> anyhow::Result<SessionContext> {
        let mut ctx = SessionContext::new();
        self.controller.restore(&mut ctx).await?;
        Ok(ctx)
    }
}
