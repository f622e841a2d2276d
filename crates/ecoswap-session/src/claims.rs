//! Unverified reading of access token claims.
//!
//! Only used to show the session's expiry to the user. The server remains the
//! sole judge of whether a token is valid.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// The claims the client cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT without checking its signature.
    pub fn decode_unverified(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp?, 0).single()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// Expiry of `token`, if it is a JWT carrying `exp`.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    TokenClaims::decode_unverified(token)?.expires_at()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jwt(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_access_token_claims() {
        let exp = Utc::now() + Duration::minutes(60);
        let token = jwt(&serde_json::json!({
            "user_id": 12,
            "email": "ana@example.com",
            "type": "access",
            "exp": exp.timestamp(),
        }));

        let claims = TokenClaims::decode_unverified(&token).unwrap();
        assert_eq!(claims.user_id, Some(serde_json::json!(12)));
        assert_eq!(claims.token_type.as_deref(), Some("access"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), exp.timestamp());
        assert!(!claims.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_expired_token() {
        let token = jwt(&serde_json::json!({
            "exp": (Utc::now() - Duration::minutes(5)).timestamp(),
        }));
        let claims = TokenClaims::decode_unverified(&token).unwrap();
        assert!(claims.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_opaque_token_has_no_claims() {
        assert_eq!(TokenClaims::decode_unverified("T1"), None);
        assert_eq!(TokenClaims::decode_unverified("a.%%%.c"), None);
        assert_eq!(expires_at("T1"), None);
    }

    #[test]
    fn test_token_without_exp_never_expires() {
        let token = jwt(&serde_json::json!({ "email": "a@b.co" }));
        let claims = TokenClaims::decode_unverified(&token).unwrap();
        assert_eq!(claims.expires_at(), None);
        assert!(!claims.is_expired_at(Utc::now()));
    }
}
