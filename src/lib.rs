//! Client for the clinic management REST backend.
//!
//! - [`api`]: the request pipeline and the resource endpoints built on it
//! - [`credentials`]: where the access and refresh tokens live
//! - [`startup`]: the one-shot token refresh run at startup
//! - [`config`]: environment-driven settings

pub mod api;
pub mod config;
pub mod credentials;
pub mod startup;
