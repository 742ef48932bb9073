pub mod github;
pub mod project;

pub use github::{graphql_value, ProjectsClient, RetryPolicy};
pub use project::{ContentKind, ProjectField, ProjectFieldValue, ProjectInfo, ProjectItem};

use tracing::debug;

/// Keyring entry holding the GitHub token.
pub const TOKEN_KEY: &str = "github_token";

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "priomage";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Where the active token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Keyring,
}

/// GitHub token from `GITHUB_TOKEN`, falling back to the keyring.
pub fn resolve_token() -> Option<(String, TokenSource)> {
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        if !token.trim().is_empty() {
            return Some((token.trim().to_string(), TokenSource::Environment));
        }
    }
    match keyring_store::get(TOKEN_KEY) {
        Ok(Some(token)) if !token.trim().is_empty() => Some((token, TokenSource::Keyring)),
        Ok(_) => None,
        Err(e) => {
            debug!("keyring lookup failed: {e}");
            None
        }
    }
}
