use anyhow::Result;

use clinic_client::credentials::{CredentialStore, FileCredentialStore};

pub fn run_logout(store: &FileCredentialStore) -> Result<()> {
    if store.pair() == Default::default() {
        println!("You are not logged in.");
        return Ok(());
    }

    store.clear()?;
    println!("✅ Successfully logged out.");

    Ok(())
}
