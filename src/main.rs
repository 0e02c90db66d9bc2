use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod command;

use clinic_client::api::{ApiClient, Page};
use clinic_client::config::ClientConfig;
use clinic_client::credentials::FileCredentialStore;
use clinic_client::startup::{finish_startup_refresh, spawn_startup_refresh};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config = config.with_base_url(api_url);
    }
    if let Some(cache_dir) = cli.cache_dir {
        config = config.with_cache_dir(cache_dir);
    }

    let Some(cmd) = cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        eprintln!("Use 'clinic login --phone <number>' to authenticate.");
        return Ok(());
    };

    let store = Arc::new(FileCredentialStore::open(config.cache_dir.as_deref())?);
    let client = ApiClient::new(&config, store.clone())?;

    // Commands that manage credentials themselves run without the background refresh.
    let manages_credentials = matches!(
        cmd,
        Commands::Login { .. } | Commands::Logout | Commands::Status | Commands::Refresh
    );
    let refresher = if cli.no_refresh || manages_credentials {
        None
    } else {
        Some(spawn_startup_refresh(client.clone()))
    };

    let result = match cmd {
        Commands::Login { phone, password } => command::run_login(&client, &phone, password).await,
        Commands::Logout => command::run_logout(&store),
        Commands::Status => command::run_status(&store, client.base_url()),
        Commands::Refresh => command::run_refresh(&client).await,
        Commands::Me => command::run_me(&client).await,
        Commands::List {
            resource,
            skip,
            limit,
            mine,
            search,
        } => command::run_list(&client, resource, Page::new(skip, limit), mine, search).await,
        Commands::Get { resource, id } => command::run_get(&client, resource, id).await,
        Commands::Delete { resource, id } => command::run_delete(&client, resource, id).await,
        Commands::Request {
            method,
            path,
            body,
            headers,
        } => command::run_request(&client, &method, &path, body, &headers).await,
    };

    // Let a still-running refresh finish writing before the process exits.
    if let Some(handle) = refresher {
        finish_startup_refresh(handle).await;
    }

    result
}
