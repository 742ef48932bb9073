mod config;

pub use config::{Config, FieldNames, GitHubConfig, ScoringConfig, UrgencyConfig};

use std::path::PathBuf;

/// Returns `~/.config/priomage[-dev]/` based on PRIOMAGE_ENV.
///
/// Set PRIOMAGE_ENV=dev to use the development config directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PRIOMAGE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("priomage-dev")
    } else {
        base_dir.join("priomage")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
