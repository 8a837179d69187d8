//! HTTP client construction, SSE line parsing and status mapping.

use std::time::Duration;

use crate::error::{ChatError, Result};

/// Build the reqwest client used for Gemini calls.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Parse an SSE "data:" line, returning None for "[DONE]" and non-data lines.
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status and body to an error.
pub fn status_to_error(status: u16, body: &str) -> ChatError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => ChatError::Authentication(message),
        429 => ChatError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => ChatError::api(status, message),
    }
}

/// Google error bodies look like `{"error": {"code": 400, "message": "..."}}`.
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// `RetryInfo.retryDelay` is a duration string such as `"17s"`.
fn extract_retry_after(body: &str) -> Option<u64> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    value
        .get("error")?
        .get("details")?
        .as_array()?
        .iter()
        .find_map(|detail| detail.get("retryDelay")?.as_str())
        .and_then(|delay| delay.strip_suffix('s')?.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}
