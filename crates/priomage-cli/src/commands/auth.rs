use clap::Subcommand;
use priomage_core::integrations::{keyring_store, resolve_token, TokenSource, TOKEN_KEY};

use super::CmdResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a GitHub token in the OS keyring
    Login {
        /// Personal access token with the `project` scope
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Check authentication status
    Status,
}

pub fn run(action: AuthAction) -> CmdResult {
    match action {
        AuthAction::Login { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err("--token must not be empty".into());
            }
            keyring_store::set(TOKEN_KEY, token)?;
            println!("GitHub token stored");
        }
        AuthAction::Logout => {
            keyring_store::delete(TOKEN_KEY)?;
            println!("GitHub token removed");
        }
        AuthAction::Status => match resolve_token() {
            Some((_, TokenSource::Environment)) => println!("authenticated (GITHUB_TOKEN)"),
            Some((_, TokenSource::Keyring)) => println!("authenticated (keyring)"),
            None => println!("not authenticated"),
        },
    }
    Ok(())
}
