//! HTTP client for the clinic backend.
//!
//! [`ApiClient`] is the single pipeline every backend call goes through. It
//! attaches the bearer token from the injected credential store and reduces
//! every failure to a [`RequestError`] carrying one message.

mod auth;
mod client;
mod error;
mod resources;
mod types;


pub use client::{ApiClient, RequestOptions};
pub use error::{RequestError, DEFAULT_ERROR_PLACEHOLDER};
pub use resources::{Report, Resource};
pub use types::{LoginRequest, Page, SupportMessageRequest, TokenResponse};

// Re-exported so callers can name methods without depending on reqwest directly.
pub use reqwest::Method;
