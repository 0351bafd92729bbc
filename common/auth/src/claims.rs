use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Verified access-token claims. The email is the caller's identity.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub email: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    pub fn email(&self) -> &str {
        &self.email
    }

    /// True when `email` names the same identity the token was issued for.
    /// Emails are compared case-sensitively.
    pub fn is_identity(&self, email: &str) -> bool {
        self.email == email
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    email: String,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        if value.email.trim().is_empty() {
            return Err(AuthError::InvalidClaim("email", value.email));
        }

        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        let issued_at = match value.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaim("iat", iat.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            email: value.email,
            issued_at,
            expires_at,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value)
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        Claims::try_from(repr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_email_and_timestamps() {
        let claims = Claims::try_from(json!({
            "email": "a@x.com",
            "iat": 1_700_000_000,
            "exp": 1_700_018_000
        }))
        .expect("claims");

        assert_eq!(claims.email(), "a@x.com");
        assert_eq!(claims.issued_at.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(claims.expires_at.timestamp(), 1_700_018_000);
    }

    #[test]
    fn rejects_blank_email() {
        let err = Claims::try_from(json!({ "email": "  ", "exp": 1 })).expect_err("blank email");
        assert!(matches!(err, AuthError::InvalidClaim("email", _)));
    }

    #[test]
    fn rejects_missing_email() {
        let err = Claims::try_from(json!({ "exp": 1 })).expect_err("no email");
        assert!(matches!(err, AuthError::InvalidJson(_)));
    }

    #[test]
    fn identity_comparison_is_case_sensitive() {
        let claims = Claims::try_from(json!({ "email": "A@x.com", "exp": 1 })).expect("claims");
        assert!(claims.is_identity("A@x.com"));
        assert!(!claims.is_identity("a@x.com"));
    }
}
