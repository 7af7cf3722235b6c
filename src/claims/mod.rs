//! Bearer-token claims parsing and dotted-path navigation.
//!
//! Tokens are standard three-segment JWTs. Only the payload segment is
//! decoded; the signature is not verified here because authentication is
//! enforced upstream of the filter. Claim paths are dotted expressions
//! (`user_context.groups.1`) navigating nested JSON objects and arrays.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::ClaimsError;

/// Decodes the payload of a JWT into its claims map.
///
/// Fails with [`ClaimsError::MalformedToken`] when the token does not have
/// exactly three segments, the payload is not valid base64url, or the
/// decoded payload is not a JSON object.
pub fn parse_token(token: &str) -> Result<Map<String, Value>, ClaimsError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1])
        .map_err(|e| ClaimsError::MalformedToken(format!("payload is not base64url: {e}")))?;

    let value: Value = serde_json::from_slice(&payload)
        .map_err(|e| ClaimsError::MalformedToken(format!("payload is not valid JSON: {e}")))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ClaimsError::MalformedToken(format!(
            "payload is not a JSON object: {other}"
        ))),
    }
}

/// Navigates a claims value by a dotted path.
///
/// At each segment: a map is indexed by key (a map always wins, even when
/// the segment is all digits), a list is indexed zero-based when the
/// segment is all ASCII digits, and anything else yields absent. Absent
/// propagates through the remaining segments. The empty path returns the
/// root value unchanged.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) if is_index(segment) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
