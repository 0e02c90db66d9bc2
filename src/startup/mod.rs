//! Startup routines.
//!
//! At load time the client makes one best-effort attempt to trade the stored
//! refresh token for a fresh access token. It runs in the background, never
//! blocks startup and never retries.

mod refresh;

pub use refresh::{
    finish_startup_refresh, refresh_credentials, spawn_startup_refresh, RefreshOutcome,
};
