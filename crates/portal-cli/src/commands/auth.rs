use anyhow::Result;
use colored::Colorize;
use portal_client::CredentialStore;
use portal_client::credentials::redact;

use crate::output::{print_error, print_success};

pub fn login(store: &dyn CredentialStore, token: &str, server: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("--token must not be empty");
    }
    store.store(token)?;
    print_success(&format!("Saved session token for {}", server.cyan()));
    Ok(())
}

pub fn logout(store: &dyn CredentialStore, profile: &str) -> Result<()> {
    if store.clear()? {
        print_success("Logged out (session token removed)");
    } else {
        println!("No session token found for profile \"{profile}\"");
    }
    Ok(())
}

pub fn whoami(store: &dyn CredentialStore, profile: &str, server: &str) -> Result<()> {
    match store.load()? {
        Some(token) => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!("{}: {}", "Server".cyan(), server.cyan());
            println!("{}: Bearer (token: {})", "Auth".cyan(), redact(&token));
        }
        None => {
            print_error(&format!("Not logged in (profile: \"{profile}\")"));
        }
    }
    Ok(())
}
