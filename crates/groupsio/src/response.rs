//! Decoding of API response bodies.
//!
//! Every response is a JSON object. Failures are reported in-band with
//! `"object": "error"` and a `type` naming the failure, often alongside a
//! non-2xx status.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a response body, turning error objects into [`Error::Api`].
pub(crate) fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        if (200..300).contains(&status) {
            Error::InvalidResponse(e.to_string())
        } else {
            Error::http(format!("HTTP {status}: {}", snippet(body)), Some(status))
        }
    })?;

    if value.get("object").and_then(Value::as_str) == Some("error") {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(Error::api(kind, Some(status)));
    }

    Ok(serde_json::from_value(value)?)
}

fn snippet(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(80) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
