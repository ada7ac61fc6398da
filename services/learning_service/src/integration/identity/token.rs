use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use service_core::auth::jwt::Claims;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Service has invalid secret.")]
    InvalidSecret,

    #[error("Invalid token.")]
    InvalidToken,
}

/// Verifies bearer tokens signed with the shared HMAC secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_base64_secret(secret: &str) -> Result<Self, TokenError> {
        let key = DecodingKey::from_base64_secret(secret).map_err(|_| TokenError::InvalidSecret)?;
        let mut validation = Validation::new(Algorithm::HS512);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data: TokenData<Claims> = jsonwebtoken::decode(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = ?e, "Failed decoding token.");
            TokenError::InvalidToken
        })?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    // base64 of "learning-service-test-secret"
    const SECRET: &str = "bGVhcm5pbmctc2VydmljZS10ZXN0LXNlY3JldA==";

    fn token(exp: usize, role: Option<&str>) -> String {
        let claims = Claims {
            sub: "user_1".to_string(),
            email: None,
            role: role.map(str::to_string),
            exp,
        };
        let key = EncodingKey::from_base64_secret(SECRET).unwrap();
        jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &key).unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn accepts_valid_token() {
        let verifier = TokenVerifier::from_base64_secret(SECRET).unwrap();
        let claims = verifier.verify(&token(far_future(), Some("educator"))).unwrap();

        assert_eq!("user_1", claims.user_id());
        assert!(claims.is_educator());
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = TokenVerifier::from_base64_secret(SECRET).unwrap();

        assert!(matches!(verifier.verify(&token(1, None)), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn rejects_foreign_signature() {
        let verifier = TokenVerifier::from_base64_secret("b3RoZXItc2VjcmV0").unwrap();

        assert!(matches!(verifier.verify(&token(far_future(), None)), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn rejects_non_base64_secret() {
        assert!(matches!(TokenVerifier::from_base64_secret("not base64!"), Err(TokenError::InvalidSecret)));
    }
}
