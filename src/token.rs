//! Client-side credential codec
//!
//! The credential is a three-segment `header.payload.signature` token. Only
//! the payload is inspected here: it is base64-decoded and parsed as a JSON
//! object. The signature is never verified client-side; the server remains
//! the authority on whether a credential is genuine.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use fdportal_protocol::Role;
use serde_json::Value;
use thiserror::Error;

/// Why a credential failed to decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 3 segments, found {0}")]
    Segments(usize),
    #[error("payload segment is empty")]
    EmptyPayload,
    #[error("payload is not valid base64")]
    Encoding,
    #[error("payload is not valid JSON")]
    Json,
    #[error("payload is not a JSON object")]
    NotObject,
}

/// Decoded credential payload
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    /// Role claim, absent when missing or outside the closed set
    pub role: Option<Role>,
    /// Expiry instant in seconds since epoch
    pub exp: Option<i64>,
    /// Subject (username)
    pub sub: Option<String>,
}

/// Decode the payload segment of `raw`
///
/// Accepts both the URL-safe and the standard base64 alphabets, with or
/// without padding.
pub fn decode(raw: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = raw.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    let encoded = segments[1].trim_end_matches('=');
    if encoded.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let normalized: String = encoded
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = STANDARD_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|_| DecodeError::Encoding)?;

    let value: Value = serde_json::from_slice(&bytes).map_err(|_| DecodeError::Json)?;
    let Value::Object(payload) = value else {
        return Err(DecodeError::NotObject);
    };

    let role = payload
        .get("role")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Role>().ok());
    let exp = payload.get("exp").and_then(expiry_seconds);
    let sub = payload
        .get("sub")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Claims { role, exp, sub })
}

// Fractional expiries round up so `exp > now` keeps its meaning for whole-second `now`.
fn expiry_seconds(value: &Value) -> Option<i64> {
    if let Some(secs) = value.as_i64() {
        return Some(secs);
    }
    value
        .as_f64()
        .filter(|secs| secs.is_finite())
        .map(|secs| secs.ceil() as i64)
}

impl Claims {
    /// True iff `exp` is present and strictly later than `now`
    pub fn is_live_at(&self, now: i64) -> bool {
        matches!(self.exp, Some(exp) if exp > now)
    }
}

/// A credential is valid iff it decodes, carries `exp`, and `exp > now`
pub fn is_valid(raw: &str, now: i64) -> bool {
    decode(raw).map(|claims| claims.is_live_at(now)).unwrap_or(false)
}

/// Role claim of `raw`, if it decodes and names a known role
pub fn extract_role(raw: &str) -> Option<Role> {
    decode(raw).ok().and_then(|claims| claims.role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::*;
    use serde_json::json;

    const NOW: i64 = 1_750_000_000;

    mod unit {
        use super::*;

        #[test]
        fn test_decode_reads_role_exp_and_sub() {
            let raw = make_token(json!({"sub": "asha", "role": "CUSTOMER", "exp": NOW + 60}));
            let claims = decode(&raw).unwrap();
            assert_eq!(claims.role, Some(Role::Customer));
            assert_eq!(claims.exp, Some(NOW + 60));
            assert_eq!(claims.sub.as_deref(), Some("asha"));
        }

        #[test]
        fn test_decode_accepts_padded_standard_alphabet() {
            let payload = json!({"role": "BANK_MANAGER", "exp": NOW + 5, "sub": "m?>"});
            let raw = make_token_with_engine(payload, &base64::engine::general_purpose::STANDARD);
            assert_eq!(extract_role(&raw), Some(Role::BankManager));
        }

        #[test]
        fn test_decode_rejects_wrong_segment_count() {
            assert_eq!(decode("only-one"), Err(DecodeError::Segments(1)));
            assert_eq!(decode("a.b"), Err(DecodeError::Segments(2)));
            assert_eq!(decode("a.b.c.d"), Err(DecodeError::Segments(4)));
            assert_eq!(decode(""), Err(DecodeError::Segments(1)));
        }

        #[test]
        fn test_decode_rejects_bad_payloads() {
            assert_eq!(decode("h..s"), Err(DecodeError::EmptyPayload));
            assert_eq!(decode("h.!!!!.s"), Err(DecodeError::Encoding));

            let not_json = STANDARD_NO_PAD.encode("not json");
            assert_eq!(decode(&format!("h.{}.s", not_json)), Err(DecodeError::Json));

            let array = STANDARD_NO_PAD.encode("[1,2,3]");
            assert_eq!(decode(&format!("h.{}.s", array)), Err(DecodeError::NotObject));
        }

        #[test]
        fn test_unknown_role_is_absent() {
            let raw = make_token(json!({"role": "ADMIN", "exp": NOW + 60}));
            assert!(decode(&raw).is_ok());
            assert_eq!(extract_role(&raw), None);
        }

        #[test]
        fn test_missing_exp_fails_closed() {
            let raw = make_token(json!({"role": "CUSTOMER"}));
            assert!(!is_valid(&raw, NOW));
        }

        #[test]
        fn test_non_numeric_exp_fails_closed() {
            let raw = make_token(json!({"role": "CUSTOMER", "exp": "tomorrow"}));
            assert!(!is_valid(&raw, NOW));
        }

        #[test]
        fn test_expiry_boundary_is_strict() {
            let raw = make_token(json!({"role": "CUSTOMER", "exp": NOW}));
            assert!(!is_valid(&raw, NOW));
            assert!(is_valid(&raw, NOW - 1));
        }

        #[test]
        fn test_fractional_expiry() {
            let raw = make_token(json!({"exp": NOW as f64 + 0.5}));
            assert!(is_valid(&raw, NOW));
            assert!(!is_valid(&raw, NOW + 1));
        }

        #[test]
        fn test_extract_role_of_garbage_is_absent() {
            assert_eq!(extract_role("garbage"), None);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_past_or_present_expiry_is_invalid(now in 0i64..4_000_000_000, back in 0i64..1_000_000) {
                let raw = make_token(json!({"role": "CUSTOMER", "exp": now - back}));
                prop_assert!(!is_valid(&raw, now));
            }

            #[test]
            fn test_future_expiry_is_valid(now in 0i64..4_000_000_000, ahead in 1i64..1_000_000) {
                let raw = make_token(json!({"role": "BANK_MANAGER", "exp": now + ahead}));
                prop_assert!(is_valid(&raw, now));
            }

            #[test]
            fn test_payload_without_exp_is_invalid(now in any::<i64>(), sub in "[a-z]{1,12}") {
                let raw = make_token(json!({"sub": sub, "role": "CUSTOMER"}));
                prop_assert!(!is_valid(&raw, now));
            }

            #[test]
            fn test_decode_never_panics(raw in "\\PC*") {
                let _ = decode(&raw);
            }
        }
    }
}
