use std::path::PathBuf;

use clap::{Parser, Subcommand};

use clinic_client::api::Resource;

/// Clinic CLI - authenticated client for the clinic management backend
#[derive(Parser)]
#[command(name = "clinic")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend base URL (overrides CLINIC_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding credentials.json (overrides CLINIC_CACHE_DIR). Defaults to ~/.clinic
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Skip the background token refresh normally run at startup
    #[arg(long, global = true)]
    pub no_refresh: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with phone number and password and store the tokens
    Login {
        /// 11-digit phone number, e.g. 09120000000
        #[arg(long)]
        phone: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget stored tokens
    Logout,
    /// Show stored credential status
    Status,
    /// Exchange the stored refresh token for a new access token
    Refresh,
    /// Show the current user
    Me,
    /// List a resource collection
    List {
        resource: Resource,

        #[arg(long, default_value_t = 0)]
        skip: u32,

        #[arg(long, default_value_t = 100)]
        limit: u32,

        /// Only the current user's records (appointments, prescriptions, factors)
        #[arg(long)]
        mine: bool,

        /// Name filter (medications only)
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one record
    Get { resource: Resource, id: u64 },
    /// Delete one record
    Delete { resource: Resource, id: u64 },
    /// Send an arbitrary request through the client
    Request {
        /// HTTP method, e.g. GET or POST
        method: String,

        /// Absolute path including query, e.g. /api/v1/users/users/me
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        /// Extra header as `name: value`; repeatable, later values win
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}
