//! JWT issuing and validation.
//!
//! Tokens travel in cookies. Each token embeds a random `csrf` value that the
//! client must echo in the `X-CSRF-TOKEN` header on mutating requests; the
//! same value is handed out in a readable cookie so browser code can find it.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bluejay_core::{Role, UserId};

use crate::config::{JwtSettings, MAX_ACCESS_TOKEN_MINUTES, MAX_REFRESH_TOKEN_DAYS};

/// Length of the random CSRF value embedded in each token.
const CSRF_TOKEN_LENGTH: usize = 32;

/// Access or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Claims stored in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub role: Role,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Double-submit CSRF value.
    pub csrf: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// The user this token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidToken` if `sub` is not a user ID.
    pub fn user_id(&self) -> Result<UserId, JwtError> {
        self.sub
            .parse()
            .map_err(|_| JwtError::InvalidToken("subject is not a user id".to_string()))
    }
}

/// A freshly signed token with the CSRF value the client must echo back.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub csrf: String,
    pub token_type: TokenType,
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh token issued together at login or signup.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// JWT errors.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("expected {expected} token")]
    WrongTokenType { expected: &'static str },

    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Signs and validates tokens with the configured HS256 secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
    audience: String,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    #[must_use]
    pub fn new(settings: &JwtSettings) -> Self {
        let secret = settings.secret.expose_secret().as_bytes();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            // Clamped so hand-built settings cannot overflow chrono
            access_ttl: Duration::minutes(
                settings.access_token_minutes.clamp(1, MAX_ACCESS_TOKEN_MINUTES),
            ),
            refresh_ttl: Duration::days(settings.refresh_token_days.clamp(1, MAX_REFRESH_TOKEN_DAYS)),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
        }
    }

    /// Issue an access token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Generation` if signing fails.
    pub fn issue_access(&self, user_id: UserId, role: Role) -> Result<IssuedToken, JwtError> {
        self.issue(user_id, role, TokenType::Access)
    }

    /// Issue an access and a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Generation` if signing fails.
    pub fn issue_pair(&self, user_id: UserId, role: Role) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: self.issue(user_id, role, TokenType::Access)?,
            refresh: self.issue(user_id, role, TokenType::Refresh)?,
        })
    }

    /// Validate a token and check that it is of the expected type.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` for expired tokens,
    /// `JwtError::WrongTokenType` when e.g. a refresh token is used as an
    /// access token, and `JwtError::InvalidToken` for anything else.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidSignature => {
                    JwtError::InvalidToken("signature verification failed".to_string())
                }
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        if data.claims.token_type != expected {
            return Err(JwtError::WrongTokenType {
                expected: expected.as_str(),
            });
        }

        Ok(data.claims)
    }

    fn issue(
        &self,
        user_id: UserId,
        role: Role,
        token_type: TokenType,
    ) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            token_type,
            csrf: random_token(CSRF_TOKEN_LENGTH),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = self.sign(&claims)?;

        Ok(IssuedToken {
            token,
            csrf: claims.csrf,
            token_type,
            expires_at,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::Generation(e.to_string()))
    }
}

/// Random alphanumeric string from the thread-local CSPRNG.
pub(crate) fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn settings(secret: &str) -> JwtSettings {
        JwtSettings {
            secret: SecretString::from(secret.to_string()),
            access_token_minutes: 15,
            refresh_token_days: 30,
            issuer: "bluejay".to_string(),
            audience: "bluejay-web".to_string(),
        }
    }

    fn service() -> JwtService {
        JwtService::new(&settings("k3Vq9xP2mL7wR4tY8nB1cZ6hJ5gF0dSa"))
    }

    #[test]
    fn test_issue_and_validate_access() {
        let jwt = service();
        let issued = jwt.issue_access(UserId::new(9), Role::Chef).unwrap();

        let claims = jwt.validate(&issued.token, TokenType::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(9));
        assert_eq!(claims.role, Role::Chef);
        assert_eq!(claims.csrf, issued.csrf);
        assert_eq!(claims.csrf.len(), CSRF_TOKEN_LENGTH);
    }

    #[test]
    fn test_pair_has_distinct_csrf_values() {
        let pair = service().issue_pair(UserId::new(1), Role::Customer).unwrap();
        assert_ne!(pair.access.csrf, pair.refresh.csrf);
        assert!(pair.refresh.expires_at > pair.access.expires_at);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let jwt = service();
        let pair = jwt.issue_pair(UserId::new(1), Role::Customer).unwrap();

        assert!(matches!(
            jwt.validate(&pair.refresh.token, TokenType::Access),
            Err(JwtError::WrongTokenType { expected: "access" })
        ));
        assert!(jwt.validate(&pair.refresh.token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token() {
        let jwt = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            role: Role::Customer,
            token_type: TokenType::Access,
            csrf: "x".to_string(),
            jti: "j".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "bluejay".to_string(),
            aud: "bluejay-web".to_string(),
        };
        let token = jwt.sign(&claims).unwrap();

        assert!(matches!(
            jwt.validate(&token, TokenType::Access),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = JwtService::new(&settings("Zq8Wm3Xr6Tv1Yp4Ks9Ln2Hb7Gc5Fd0Ja"));
        let issued = other.issue_access(UserId::new(1), Role::Customer).unwrap();

        assert!(matches!(
            service().validate(&issued.token, TokenType::Access),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_out_of_range_lifetimes_are_clamped() {
        let mut huge = settings("k3Vq9xP2mL7wR4tY8nB1cZ6hJ5gF0dSa");
        huge.access_token_minutes = i64::MAX;
        huge.refresh_token_days = i64::MAX;
        let jwt = JwtService::new(&huge);

        let pair = jwt.issue_pair(UserId::new(1), Role::Customer).unwrap();
        let horizon = Utc::now() + Duration::days(MAX_REFRESH_TOKEN_DAYS + 1);
        assert!(pair.refresh.expires_at < horizon);
        assert!(jwt.validate(&pair.access.token, TokenType::Access).is_ok());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            service().validate("not.a.jwt", TokenType::Access),
            Err(JwtError::InvalidToken(_))
        ));
    }
}
