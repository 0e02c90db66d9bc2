//! The single error kind surfaced by the request pipeline.

use serde_json::Value;

/// Generic failure text used when a failed response carries no usable body.
/// Persian for "error", matching what the backend's own messages are written in.
pub const DEFAULT_ERROR_PLACEHOLDER: &str = "خطا";

/// Failure of a backend call.
///
/// Non-2xx responses, transport faults and unusable error bodies all collapse
/// into this one type. Only the extracted message is exposed: callers never see
/// the status code, headers or raw body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    message: String,
}

impl RequestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error for a non-2xx response.
    ///
    /// Message priority: `detail`, then `message`, then the whole JSON body.
    /// If the body is not JSON the placeholder is used, and if that is empty
    /// the message becomes `HTTP <status>`.
    pub fn from_response(http_status: u16, body: &str, placeholder: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| message_from_body(&value))
            .unwrap_or_else(|| placeholder.to_string());

        if message.is_empty() {
            return Self::new(format!("HTTP {}", http_status));
        }

        Self::new(message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn message_from_body(body: &Value) -> Option<String> {
    // A JSON `null` body has no fields to read; treat it like a parse failure.
    if body.is_null() {
        return None;
    }

    for field in ["detail", "message"] {
        if let Some(value) = body.get(field).filter(|v| is_truthy(v)) {
            return Some(render(value));
        }
    }

    Some(body.to_string())
}

/// Loose truthiness: `null`, `false`, zero and empty strings do not count.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_wins() {
        let err = RequestError::from_response(
            404,
            r#"{"detail":"not found","message":"ignored"}"#,
            DEFAULT_ERROR_PLACEHOLDER,
        );
        assert_eq!(err.message(), "not found");
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn test_message_when_detail_missing_or_empty() {
        let err = RequestError::from_response(400, r#"{"message":"bad input"}"#, "x");
        assert_eq!(err.message(), "bad input");

        let err = RequestError::from_response(400, r#"{"detail":"","message":"bad"}"#, "x");
        assert_eq!(err.message(), "bad");

        let err = RequestError::from_response(400, r#"{"detail":null,"message":"bad"}"#, "x");
        assert_eq!(err.message(), "bad");
    }

    #[test]
    fn test_whole_body_when_no_known_field() {
        let err = RequestError::from_response(409, r#"{"code":7}"#, "x");
        assert_eq!(err.message(), r#"{"code":7}"#);

        let err = RequestError::from_response(409, r#""plain""#, "x");
        assert_eq!(err.message(), r#""plain""#);
    }

    #[test]
    fn test_non_string_detail_is_serialized() {
        let body = r#"{"detail":[{"loc":["body","phone_number"],"msg":"field required"}]}"#;
        let err = RequestError::from_response(422, body, "x");
        assert_eq!(
            err.message(),
            r#"[{"loc":["body","phone_number"],"msg":"field required"}]"#
        );
    }

    #[test]
    fn test_body_keeps_backend_key_order() {
        let err = RequestError::from_response(409, r#"{"code":7,"a":1}"#, "x");
        assert_eq!(err.message(), r#"{"code":7,"a":1}"#);

        let body = r#"{"detail":{"type":"conflict","field":"national_code","at":3}}"#;
        let err = RequestError::from_response(409, body, "x");
        assert_eq!(
            err.message(),
            r#"{"type":"conflict","field":"national_code","at":3}"#
        );
    }

    #[test]
    fn test_unparseable_body_uses_placeholder() {
        let err = RequestError::from_response(500, "", DEFAULT_ERROR_PLACEHOLDER);
        assert_eq!(err.message(), DEFAULT_ERROR_PLACEHOLDER);

        let err = RequestError::from_response(502, "<html>Bad Gateway</html>", "failed");
        assert_eq!(err.message(), "failed");

        let err = RequestError::from_response(500, "null", "failed");
        assert_eq!(err.message(), "failed");
    }

    #[test]
    fn test_empty_placeholder_falls_back_to_status() {
        let err = RequestError::from_response(500, "", "");
        assert_eq!(err.message(), "HTTP 500");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&serde_json::json!(false)));
        assert!(!is_truthy(&serde_json::json!(0)));
        assert!(!is_truthy(&serde_json::json!("")));
        assert!(is_truthy(&serde_json::json!(3)));
        assert!(is_truthy(&serde_json::json!([])));
        assert!(is_truthy(&serde_json::json!({})));
    }
}
