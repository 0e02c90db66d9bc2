use anyhow::{Context, Result};

use clinic_client::api::{ApiClient, Method, RequestOptions};

use super::print_payload;

/// Split `name: value` into its parts.
fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Header must look like 'name: value', got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header name is empty in '{}'", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

pub async fn run_request(
    client: &ApiClient,
    method: &str,
    path: &str,
    body: Option<String>,
    headers: &[String],
) -> Result<()> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", method))?;

    if let Some(ref body) = body {
        serde_json::from_str::<serde_json::Value>(body).context("--body is not valid JSON")?;
    }

    let mut options = RequestOptions::new();
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        options = options.header(name, value);
    }

    print_payload(client.send_with(path, method, body, options).await?)
}
