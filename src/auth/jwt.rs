//! JWT validation
//!
//! HS256 bearer tokens with standard claims. The shared secret comes
//! from configuration; the optional audience claim is enforced when
//! configured.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::types::Result;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or service identity)
    pub sub: String,
    /// Expiry, seconds since epoch
    pub exp: u64,
    /// Audience (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// Placeholder claims for dev-mode requests
    pub fn anonymous() -> Self {
        Self {
            sub: "anonymous".to_string(),
            exp: 0,
            aud: None,
        }
    }
}

/// Validates HS256 bearer tokens against the shared secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => {
                validation.validate_aud = false;
            }
        }
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp_offset: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as u64;
        let claims = Claims {
            sub: "test-user".to_string(),
            exp,
            aud: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let validator = JwtValidator::new("secret", None);
        let claims = validator.validate(&token("secret", 3600)).unwrap();
        assert_eq!(claims.sub, "test-user");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let validator = JwtValidator::new("secret", None);
        assert!(validator.validate(&token("other", 3600)).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let validator = JwtValidator::new("secret", None);
        assert!(validator.validate(&token("secret", -3600)).is_err());
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token_from_header(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
