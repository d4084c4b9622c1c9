//! Response body unwrapping.
//!
//! Most routes answer with `{success, message, data, total?}`. A few list
//! routes return the payload bare. Both reduce to the same [`Unwrapped`].

use serde_json::Value;

use crate::error::{ApiError, Result};

/// Payload extracted from a 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped {
    pub data: Value,
    pub total: Option<u64>,
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    matches!(map.get("success"), Some(Value::Bool(_)))
        && (map.contains_key("data") || map.contains_key("message"))
}

/// Splits a 2xx body into its payload, rejecting `success: false` envelopes.
pub fn unwrap_body(bytes: &[u8]) -> Result<Unwrapped> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Unwrapped {
            data: Value::Null,
            total: None,
        });
    }

    let body: Value = serde_json::from_slice(bytes)?;
    match body {
        Value::Object(mut map) if is_envelope(&map) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(crate::constants::messages::REQUEST_FAILED)
                    .to_string();
                return Err(ApiError::Rejected(message));
            }
            let total = map.get("total").and_then(Value::as_u64);
            Ok(Unwrapped {
                data: map.remove("data").unwrap_or(Value::Null),
                total,
            })
        }
        bare => Ok(Unwrapped {
            data: bare,
            total: None,
        }),
    }
}

/// Human message from an error body: `message`, FastAPI's `detail`, or nothing.
#[must_use]
pub fn server_message(bytes: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(bytes).ok()?;
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match body.get("detail")? {
            Value::String(detail) => Some(detail.clone()),
            Value::Array(items) => items
                .first()
                .and_then(|item| item.get("msg"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })?;
    (!message.is_empty()).then_some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_yields_data_only() {
        let body = br#"{"success": true, "message": "ok", "data": [1, 2], "total": 40}"#;
        let unwrapped = unwrap_body(body).unwrap();
        assert_eq!(unwrapped.data, json!([1, 2]));
        assert_eq!(unwrapped.total, Some(40));
    }

    #[test]
    fn test_bare_body_passes_through() {
        let body = br#"[{"id": 1}]"#;
        assert_eq!(unwrap_body(body).unwrap().data, json!([{"id": 1}]));

        let object = br#"{"subscriptions": [], "pagination": {"page": 1}}"#;
        assert_eq!(unwrap_body(object).unwrap().data["pagination"]["page"], 1);

        assert_eq!(unwrap_body(b"").unwrap().data, Value::Null);
    }

    #[test]
    fn test_rejected_envelope() {
        let body = br#"{"success": false, "message": "quota exceeded", "data": null}"#;
        match unwrap_body(body) {
            Err(ApiError::Rejected(message)) => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_server_message_sources() {
        assert_eq!(
            server_message(br#"{"message": "boom"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(
            server_message(br#"{"detail": "Already subscribed"}"#).as_deref(),
            Some("Already subscribed")
        );
        assert_eq!(
            server_message(br#"{"detail": [{"loc": ["query"], "msg": "field required"}]}"#)
                .as_deref(),
            Some("field required")
        );
        assert_eq!(server_message(b"<html>"), None);
        assert_eq!(server_message(br#"{"message": ""}"#), None);
    }
}
