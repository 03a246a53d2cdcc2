//! Token Codec
//!
//! Stateless HS256 signing and verification of the three token kinds.
//! Nothing is stored server-side; expiry is the only invalidation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::{token_kind::TokenKind, user_id::UserId};
use crate::error::{AuthError, AuthResult};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Signed claims
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    id: String,
    email: String,
    #[serde(rename = "type")]
    kind: TokenKind,
    iat: i64,
    exp: i64,
}

/// Verified token content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// Subject user id, as signed
    pub id: String,
    pub email: String,
    pub kind: TokenKind,
}

/// Access and refresh token issued together on every successful sign-in
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues the session pair once an account is established
pub trait TokenIssuer: Send + Sync {
    fn issue_pair(&self, user_id: UserId, email: &str) -> AuthResult<TokenPair>;
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Fails when the secret is empty, so a misconfigured process never starts
    pub fn new(secret: &str) -> AuthResult<Self> {
        if secret.trim().is_empty() {
            return Err(AuthError::Configuration(
                "JWT signing secret is not configured".to_string(),
            ));
        }

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn issue(&self, user_id: UserId, email: &str, kind: TokenKind) -> AuthResult<String> {
        self.issue_at(user_id, email, kind, Utc::now())
    }

    /// Issue as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: UserId,
        email: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        let claims = Claims {
            id: user_id.to_string(),
            email: email.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + kind.lifetime()).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign {kind}: {e}")))
    }

    /// `NormalToken` + `RefreshToken`
    pub fn issue_pair(&self, user_id: UserId, email: &str) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(user_id, email, TokenKind::NormalToken)?,
            refresh_token: self.issue(user_id, email, TokenKind::RefreshToken)?,
        })
    }

    /// Verify signature and expiry
    ///
    /// The kind is returned, not checked.
    pub fn decode(&self, token: &str) -> AuthResult<TokenPayload> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenPayload {
            id: data.claims.id,
            email: data.claims.email,
            kind: data.claims.kind,
        })
    }
}

impl TokenIssuer for TokenCodec {
    fn issue_pair(&self, user_id: UserId, email: &str) -> AuthResult<TokenPair> {
        TokenCodec::issue_pair(self, user_id, email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-signing-secret").unwrap()
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        assert!(matches!(
            TokenCodec::new(""),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            TokenCodec::new("   "),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_decode_returns_issued_payload_for_every_kind() {
        let codec = codec();
        for kind in [
            TokenKind::EmailToken,
            TokenKind::NormalToken,
            TokenKind::RefreshToken,
        ] {
            let token = codec.issue(UserId::new(17), "a@b.com", kind).unwrap();
            let payload = codec.decode(&token).unwrap();
            assert_eq!(
                payload,
                TokenPayload {
                    id: "17".to_string(),
                    email: "a@b.com".to_string(),
                    kind,
                }
            );
        }
    }

    #[test]
    fn test_expired_email_token_is_rejected() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::minutes(31);
        let token = codec
            .issue_at(UserId::new(1), "a@b.com", TokenKind::EmailToken, issued_at)
            .unwrap();

        assert!(matches!(codec.decode(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_email_token_valid_within_lifetime() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::minutes(29);
        let token = codec
            .issue_at(UserId::new(1), "a@b.com", TokenKind::EmailToken, issued_at)
            .unwrap();

        assert!(codec.decode(&token).is_ok());
    }

    #[test]
    fn test_expired_normal_token_is_rejected() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::hours(721);
        let token = codec
            .issue_at(UserId::new(1), "a@b.com", TokenKind::NormalToken, issued_at)
            .unwrap();

        assert!(matches!(codec.decode(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let other = TokenCodec::new("another-secret").unwrap();
        let token = other
            .issue(UserId::new(1), "a@b.com", TokenKind::NormalToken)
            .unwrap();

        assert!(matches!(codec().decode(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let codec = codec();
        assert!(matches!(codec.decode("not-a-jwt"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(codec.decode(""), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_type_claim_name() {
        let codec = codec();
        let token = codec
            .issue(UserId::new(5), "a@b.com", TokenKind::RefreshToken)
            .unwrap();

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.insecure_disable_signature_validation();
        let payload = decode::<serde_json::Value>(&token, &DecodingKey::from_secret(b""), &validation)
            .unwrap()
            .claims;

        assert_eq!(payload["type"], "RefreshToken");
        assert_eq!(payload["id"], "5");
    }

    #[test]
    fn test_pair_kinds() {
        let codec = codec();
        let pair = codec.issue_pair(UserId::new(9), "a@b.com").unwrap();
        assert_eq!(codec.decode(&pair.access_token).unwrap().kind, TokenKind::NormalToken);
        assert_eq!(codec.decode(&pair.refresh_token).unwrap().kind, TokenKind::RefreshToken);
    }
}
