//! Configuration loader and data directory resolution.
//!
//! Reads `config.toml` from the data directory (`~/.tutor/` in production)
//! and deserializes it into [`TutorConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use tutor_types::config::TutorConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TUTOR_DATA_DIR";

/// Resolve the data directory: `TUTOR_DATA_DIR`, then `~/.tutor`, then `./.tutor`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".tutor");
    }

    PathBuf::from(".tutor")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`TutorConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> TutorConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return TutorConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return TutorConfig::default();
        }
    };

    match toml::from_str::<TutorConfig>(&content) {
        Ok(config) => {
            if config.max_image_bytes > config.image_limit() {
                tracing::warn!(
                    configured = config.max_image_bytes,
                    limit = config.image_limit(),
                    "max_image_bytes above the hard limit, clamping"
                );
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            TutorConfig::default()
        }
    }
}
