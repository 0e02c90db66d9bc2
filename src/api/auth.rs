use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use super::client::ApiClient;
use super::error::RequestError;
use super::types::LoginRequest;

const LOGIN_PATH: &str = "/api/v1/auth/auth/login";
const REFRESH_PATH: &str = "/api/v1/auth/auth/refresh";

impl ApiClient {
    /// Exchange phone number and password for a token payload.
    ///
    /// The credential store is not touched; persisting the tokens is up to the caller.
    pub async fn login(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<Option<Value>, RequestError> {
        let body = LoginRequest {
            phone_number: phone_number.to_string(),
            password: password.to_string(),
        };

        debug!("=== Login Request ===");
        self.send_json(LOGIN_PATH, Method::POST, &body).await
    }

    /// Ask the backend for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<Value>, RequestError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("refresh_token", refresh_token)
            .finish();

        debug!("=== Token Refresh Request ===");
        self.send(&format!("{}?{}", REFRESH_PATH, query), Method::POST, None)
            .await
    }
}
