use anyhow::Result;

use clinic_client::credentials::{CredentialStore, FileCredentialStore};

pub fn run_status(store: &FileCredentialStore, base_url: &str) -> Result<()> {
    let pair = store.pair();

    if pair.access_token.is_some() {
        println!("✅ Logged in");
    } else {
        println!("❌ Not logged in");
        println!("   Run 'clinic login' to authenticate.");
    }

    println!("   Backend: {}", base_url);
    println!(
        "   Refresh token: {}",
        if pair.refresh_token.is_some() {
            "stored"
        } else {
            "none"
        }
    );
    if let Some(updated_at) = store.updated_at() {
        println!("   Updated: {}", updated_at.to_rfc3339());
    }
    println!("   File: {}", store.path().display());

    Ok(())
}
