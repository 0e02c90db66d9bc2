use std::io::{self, Write};

use anyhow::{Context, Result};

use clinic_client::api::{ApiClient, TokenResponse};
use clinic_client::credentials::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use clinic_client::startup::{refresh_credentials, RefreshOutcome};

pub async fn run_login(client: &ApiClient, phone: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            print!("Password: ");
            io::stdout().flush()?;

            let mut answer = String::new();
            io::stdin().read_line(&mut answer)?;
            answer.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    println!("🔐 Logging in as {}...", phone);

    let tokens = TokenResponse::from_value(client.login(phone, &password).await?);
    let access_token = tokens
        .usable_access_token()
        .context("Login response does not contain a valid 'access_token' field")?;

    let store = client.credentials();
    store.set(ACCESS_TOKEN_KEY, access_token)?;
    match tokens.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        Some(refresh_token) => store.set(REFRESH_TOKEN_KEY, refresh_token)?,
        None => store.remove(REFRESH_TOKEN_KEY)?,
    }

    let name = tokens
        .user
        .as_ref()
        .and_then(|u| u.get("full_name"))
        .and_then(|n| n.as_str());
    match name {
        Some(name) => println!("\n✅ Logged in as {}.", name),
        None => println!("\n✅ Logged in."),
    }

    Ok(())
}

pub async fn run_refresh(client: &ApiClient) -> Result<()> {
    match refresh_credentials(client).await? {
        RefreshOutcome::Skipped => {
            println!("❌ No refresh token stored.");
            println!("   Run 'clinic login' to authenticate.");
        }
        RefreshOutcome::Refreshed => println!("✅ Access token refreshed."),
        RefreshOutcome::Unchanged => {
            println!("⚠️  The backend did not return a new access token; nothing changed.")
        }
    }
    Ok(())
}
