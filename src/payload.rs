//! Display formatting for the JSON payload embedded in reconciliation records.
//!
//! Producers store the payload as a JSON string in `payloadstr`, and some of
//! them encode it twice. Formatting is best effort: anything that does not
//! decode is shown as the raw text.

use serde_json::Value;
use tracing::debug;

/// Text shown when a record carries no payload.
pub const EMPTY_PAYLOAD: &str = "{}";

/// Decode a payload string, unwrapping one extra level of string encoding.
pub fn decode_payload(raw: &str) -> serde_json::Result<Value> {
  match serde_json::from_str(raw)? {
    Value::String(inner) => serde_json::from_str(&inner),
    other => Ok(other),
  }
}

/// Pretty-print a payload with 2-space indentation.
pub fn format_payload(raw: Option<&str>) -> String {
  let raw = match raw {
    Some(raw) if !raw.is_empty() => raw,
    _ => return EMPTY_PAYLOAD.to_string(),
  };

  match decode_payload(raw).and_then(|value| serde_json::to_string_pretty(&value)) {
    Ok(pretty) => pretty,
    Err(e) => {
      debug!(error = %e, "payload is not JSON, showing raw text");
      raw.to_string()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PRETTY: &str = "{\n  \"a\": 1\n}";

  #[test]
  fn test_plain_json_is_pretty_printed() {
    assert_eq!(format_payload(Some(r#"{"a":1}"#)), PRETTY);
  }

  #[test]
  fn test_double_encoded_json_is_unwrapped_once() {
    assert_eq!(format_payload(Some(r#""{\"a\":1}""#)), PRETTY);
  }

  #[test]
  fn test_triple_encoding_stops_after_one_unwrap() {
    let triple = serde_json::to_string(&serde_json::to_string(r#"{"a":1}"#).unwrap()).unwrap();
    assert_eq!(format_payload(Some(&triple)), "\"{\\\"a\\\":1}\"");
  }

  #[test]
  fn test_invalid_payload_is_returned_unchanged() {
    assert_eq!(format_payload(Some("not json")), "not json");
    // Outer layer decodes to a string that is not JSON itself
    assert_eq!(format_payload(Some(r#""hello""#)), r#""hello""#);
  }

  #[test]
  fn test_missing_or_empty_payload() {
    assert_eq!(format_payload(None), "{}");
    assert_eq!(format_payload(Some("")), "{}");
  }

  #[test]
  fn test_key_order_is_preserved() {
    assert_eq!(
      format_payload(Some(r#"{"z":1,"a":2}"#)),
      "{\n  \"z\": 1,\n  \"a\": 2\n}"
    );
  }
}
