//! Unverified access token payload inspection
//!
//! Reads the claim set out of a compact `header.payload.signature` token.
//! The signature is NOT checked. The only use of the decoded claims is the
//! ownership check in `matches_client`; callers that need authenticity have
//! to verify the signature separately.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

use crate::constants::PROVIDER_ID_CLAIM;
use crate::error::{Error, Result};

/// Tokens in the wild come padded and unpadded, url-safe and standard.
const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Claim set decoded from a token payload. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The provider-identity claim, when present and a string.
    pub fn pid(&self) -> Option<&str> {
        self.get(PROVIDER_ID_CLAIM).and_then(Value::as_str)
    }
}

/// Decode the payload segment of `token` into its claim set.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(Error::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = decode_segment(segments[1])?;
    let claims: Map<String, Value> = serde_json::from_slice(&payload)
        .map_err(|e| Error::MalformedToken(format!("payload is not a JSON object: {e}")))?;
    Ok(Claims(claims))
}

fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(segment)
        .or_else(|_| STANDARD_LENIENT.decode(segment))
        .map_err(|e| Error::MalformedToken(format!("payload is not base64: {e}")))
}

/// Whether the token was minted for `client_id`.
pub fn matches_client(claims: &Claims, client_id: &str) -> bool {
    claims
        .pid()
        .is_some_and(|pid| !pid.is_empty() && pid == client_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use serde_json::json;

    fn token(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn decodes_pid_claim() {
        let claims = decode_claims(&token(r#"{"pid":"abc","sub":"u1"}"#)).unwrap();
        assert_eq!(claims.pid(), Some("abc"));
        assert_eq!(claims.get("sub"), Some(&json!("u1")));
    }

    #[test]
    fn accepts_padded_standard_base64() {
        // encodes to a '+' and trailing '=' under the standard alphabet
        let payload = STANDARD.encode(r#"{"pid":"abc","q":"??>"}"#);
        let claims = decode_claims(&format!("h.{payload}.s")).unwrap();
        assert_eq!(claims.pid(), Some("abc"));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for bad in ["", "onlyone", "two.parts", "a.b.c.d"] {
            let err = decode_claims(bad).unwrap_err();
            assert!(matches!(err, Error::MalformedToken(_)), "{bad:?} gave {err:?}");
        }
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_claims("h.!!!not-base64!!!.s").unwrap_err();
        assert!(err.to_string().contains("base64"), "got: {err}");
    }

    #[test]
    fn rejects_non_object_payload() {
        for payload in ["not json", "[1,2]", "\"abc\""] {
            let err = decode_claims(&token(payload)).unwrap_err();
            assert!(matches!(err, Error::MalformedToken(_)), "{payload:?} gave {err:?}");
        }
    }

    #[test]
    fn matches_only_same_client() {
        let claims = decode_claims(&token(r#"{"pid":"abc"}"#)).unwrap();
        assert!(matches_client(&claims, "abc"));
        assert!(!matches_client(&claims, "other"));
    }

    #[test]
    fn missing_or_non_string_pid_never_matches() {
        let missing = decode_claims(&token(r#"{"sub":"u1"}"#)).unwrap();
        assert!(!matches_client(&missing, "abc"));

        let numeric = decode_claims(&token(r#"{"pid":42}"#)).unwrap();
        assert!(!matches_client(&numeric, "42"));

        let empty = decode_claims(&token(r#"{"pid":""}"#)).unwrap();
        assert!(!matches_client(&empty, ""));
    }
}
