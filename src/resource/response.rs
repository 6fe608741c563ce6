//! Turns whatever the executor returned into an optional JSON value.
//!
//! Detection goes by capability markers rather than by client type:
//! a pre-parsed value is used as-is, a raw response is checked for status
//! (non-success fails, 204 is no content) and then decoded as JSON when the
//! content type says so or when it carries no header metadata at all.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

use super::executor::ExecutorResponse;
use crate::error::TransportError;

/// `Ok(None)` means the server sent no content.
pub(crate) fn decode(
    method: &Method,
    url: &str,
    response: ExecutorResponse,
) -> Result<Option<Value>, TransportError> {
    match response {
        ExecutorResponse::Parsed(Value::Null) => Ok(None),
        ExecutorResponse::Parsed(value) => Ok(Some(value)),
        ExecutorResponse::Raw(response) => decode_raw(method, url, response),
    }
}

fn decode_raw(
    method: &Method,
    url: &str,
    response: http::Response<Vec<u8>>,
) -> Result<Option<Value>, TransportError> {
    let (parts, body) = response.into_parts();

    if !parts.status.is_success() {
        return Err(TransportError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status: parts.status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    if parts.status == StatusCode::NO_CONTENT || body.is_empty() {
        return Ok(None);
    }

    if is_json(&parts.headers) {
        return serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| TransportError::InvalidResponse {
                url: url.to_string(),
                reason: format!("malformed JSON body: {}", e),
            });
    }

    if parts.headers.is_empty() {
        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            return Ok(Some(value));
        }
    }

    String::from_utf8(body)
        .map(|text| Some(Value::String(text)))
        .map_err(|e| TransportError::InvalidResponse {
            url: url.to_string(),
            reason: format!("body is not valid UTF-8: {}", e),
        })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}
