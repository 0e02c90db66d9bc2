use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, RequestError, TokenResponse};
use crate::credentials::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// What a refresh attempt did to the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh token stored; no request was made.
    Skipped,
    /// A new access token was stored.
    Refreshed,
    /// The backend answered but the store was left as it was.
    Unchanged,
}

/// Trade the stored refresh token for a new access token.
///
/// Only `access_token` is ever written, and only when the response carries a
/// non-empty one. Backend failures are returned to the caller, who decides
/// whether to discard them.
pub async fn refresh_credentials(client: &ApiClient) -> Result<RefreshOutcome, RequestError> {
    let store = client.credentials();

    let Some(refresh_token) = store.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty()) else {
        debug!("No refresh token stored, skipping token refresh");
        return Ok(RefreshOutcome::Skipped);
    };

    let response = TokenResponse::from_value(client.refresh(&refresh_token).await?);

    let Some(access_token) = response.usable_access_token() else {
        debug!("Refresh response carried no access token");
        return Ok(RefreshOutcome::Unchanged);
    };

    if let Err(e) = store.set(ACCESS_TOKEN_KEY, access_token) {
        warn!("Failed to store refreshed access token: {:#}", e);
        return Ok(RefreshOutcome::Unchanged);
    }

    debug!("Access token refreshed");
    Ok(RefreshOutcome::Refreshed)
}

/// Run [`refresh_credentials`] once in the background.
///
/// Failures are logged at info level and dropped: a rejected or expired
/// refresh token must not stop the process from starting.
pub fn spawn_startup_refresh(client: ApiClient) -> JoinHandle<()> {
    tokio::spawn(async move {
        match refresh_credentials(&client).await {
            Ok(outcome) => debug!("Startup token refresh finished: {:?}", outcome),
            Err(e) => info!("token refresh failed: {}", e),
        }
    })
}

/// Wait for a task started by [`spawn_startup_refresh`].
///
/// Returns `false` when the task panicked or was cancelled; the join error is
/// logged rather than propagated.
pub async fn finish_startup_refresh(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Startup token refresh task did not complete: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::credentials::MemoryCredentialStore;
    use mockito::Matcher;
    use std::io;
    use std::sync::{Arc, Mutex};

    const REFRESH_PATH: &str = r"^/api/v1/auth/auth/refresh";

    fn client_for(url: &str, store: Arc<MemoryCredentialStore>) -> ApiClient {
        let config = ClientConfig::default().with_base_url(url);
        ApiClient::new(&config, store).unwrap()
    }

    #[tokio::test]
    async fn test_skips_without_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(REFRESH_PATH.to_string()))
            .expect(0)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_pair(Some("old"), None));
        let client = client_for(&server.url(), store.clone());

        let outcome = refresh_credentials(&client).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("old"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stores_new_access_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(REFRESH_PATH.to_string()))
            .match_query(Matcher::UrlEncoded(
                "refresh_token".to_string(),
                "r+1/=".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"X","refresh_token":"new-r","token_type":"bearer"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_pair(Some("old"), Some("r+1/=")));
        let client = client_for(&server.url(), store.clone());

        let outcome = refresh_credentials(&client).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Refreshed);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("X"));
        // Only the access token is rotated.
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("r+1/="));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_response_without_access_token_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex(REFRESH_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_pair(Some("old"), Some("r")));
        let client = client_for(&server.url(), store.clone());

        let outcome = refresh_credentials(&client).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_rejected_refresh_returns_error_and_keeps_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex(REFRESH_PATH.to_string()))
            .with_status(401)
            .with_body(r#"{"detail":"توکن نامعتبر است"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_pair(Some("old"), Some("expired")));
        let client = client_for(&server.url(), store.clone());

        let err = refresh_credentials(&client).await.unwrap_err();
        assert_eq!(err.message(), "توکن نامعتبر است");
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_spawned_refresh_swallows_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(REFRESH_PATH.to_string()))
            .with_status(500)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_pair(Some("old"), Some("r")));
        let client = client_for(&server.url(), store.clone());

        spawn_startup_refresh(client)
            .await
            .expect("startup refresh task must not panic");
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("old"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_spawned_refresh_swallows_transport_failure() {
        let store = Arc::new(MemoryCredentialStore::with_pair(None, Some("r")));
        let client = client_for("http://127.0.0.1:1", store.clone());

        spawn_startup_refresh(client)
            .await
            .expect("startup refresh task must not panic");
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_spawned_refresh_updates_store() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex(REFRESH_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"access_token":"fresh"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_pair(None, Some("r")));
        let client = client_for(&server.url(), store.clone());

        spawn_startup_refresh(client).await.unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    }

    /// Formatted log output collected in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_swallowed_refresh_failure_logs_nothing_above_info() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Regex(REFRESH_PATH.to_string()))
            .with_status(401)
            .with_body(r#"{"detail":"expired"}"#)
            .create_async()
            .await;

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = Arc::new(MemoryCredentialStore::with_pair(Some("old"), Some("r")));
        let client = client_for(&server.url(), store.clone());
        assert!(finish_startup_refresh(spawn_startup_refresh(client)).await);

        let output = logs.contents();
        assert!(output.contains("token refresh failed: expired"), "{}", output);
        for line in output.lines() {
            assert!(
                !line.contains(" ERROR ") && !line.contains(" WARN "),
                "unexpected log line: {}",
                line
            );
        }
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_finish_reports_panicked_task() {
        let handle = tokio::spawn(async { panic!("refresh task blew up") });
        assert!(!finish_startup_refresh(handle).await);

        let handle = tokio::spawn(async {});
        assert!(finish_startup_refresh(handle).await);
    }
}
