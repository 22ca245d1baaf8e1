use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Verifies HS256 session tokens and yields the opaque user id
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Supabase tokens carry aud = "authenticated"
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// User id from an `Authorization` header value
    pub fn user_id_from_header(&self, header: Option<&str>) -> Result<String, AuthError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims {
            sub: "user-123".to_string(),
            exp,
            email: None,
            role: Some("authenticated".to_string()),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn future_exp() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_valid_token() {
        let verifier = TokenVerifier::new("secret");
        let header = format!("Bearer {}", token("secret", future_exp()));
        assert_eq!(verifier.user_id_from_header(Some(&header)).unwrap(), "user-123");
    }

    #[test]
    fn test_wrong_secret() {
        let verifier = TokenVerifier::new("secret");
        let header = format!("Bearer {}", token("other", future_exp()));
        assert!(matches!(
            verifier.user_id_from_header(Some(&header)),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let verifier = TokenVerifier::new("secret");
        let header = format!("Bearer {}", token("secret", 1000));
        assert!(verifier.user_id_from_header(Some(&header)).is_err());
    }

    #[test]
    fn test_missing_header() {
        let verifier = TokenVerifier::new("secret");
        assert!(matches!(verifier.user_id_from_header(None), Err(AuthError::MissingToken)));
        assert!(matches!(
            verifier.user_id_from_header(Some("Basic abc")),
            Err(AuthError::MissingToken)
        ));
    }
}
