//! HS256 bearer tokens.

use crate::config::AuthConfig;
use crate::domain::{User, UserId};
use crate::error::{ConfigError, Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Login name at issue time (informational)
    pub username: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Signs and verifies bearer tokens with a shared secret.
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Creates an authority for `secret`; issued tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Creates an authority from the `auth` configuration section, honouring
    /// the environment override for the secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no secret is configured.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config.resolved_secret();
        if secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt-secret must not be empty".to_string()).into());
        }
        let ttl = Duration::try_hours(config.token_ttl_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "auth.token-ttl-hours is out of range: {}",
                    config.token_ttl_hours
                ))
            })?;
        Ok(Self::new(secret.as_bytes(), ttl))
    }

    /// Mints a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Token`] if signing fails.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(Error::Token)
    }

    /// Verifies signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] for any invalid token.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| Error::Authentication(e.to_string()))
    }

    /// Verifies an `Authorization` header value and returns the user id it names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when the header is not a valid bearer token.
    pub fn verify_header(&self, header: &str) -> Result<UserId> {
        let token = parse_bearer(header)
            .ok_or_else(|| Error::Authentication("expected 'Bearer <token>'".to_string()))?;
        let claims = self.verify(token)?;
        Ok(UserId::new(claims.sub))
    }
}

/// Extracts the token from a `Bearer <token>` header value.
#[must_use]
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user() -> User {
        User {
            id: UserId::new("usr-abc"),
            username: "alice".to_string(),
            is_admin: true,
            is_developer: false,
            date: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let authority = TokenAuthority::new(b"secret", Duration::hours(1));
        let token = authority.issue(&user()).unwrap();

        let claims = authority.verify(&token).unwrap();
        assert_eq!(claims.sub, "usr-abc");
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);

        let id = authority.verify_header(&format!("Bearer {token}")).unwrap();
        assert_eq!(id, UserId::new("usr-abc"));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenAuthority::new(b"one", Duration::hours(1))
            .issue(&user())
            .unwrap();
        let err = TokenAuthority::new(b"two", Duration::hours(1))
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let authority = TokenAuthority::new(b"secret", Duration::hours(-2));
        let token = authority.issue(&user()).unwrap();
        assert!(matches!(
            authority.verify(&token),
            Err(Error::Authentication(_))
        ));
    }

    #[rstest]
    #[case::overflowing(i64::MAX)]
    #[case::negative(-5)]
    fn out_of_range_ttl_is_a_config_error(#[case] hours: i64) {
        let config = AuthConfig {
            jwt_secret: "secret".to_string(),
            token_ttl_hours: hours,
        };
        let err = TokenAuthority::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid(_))));
    }

    #[rstest]
    #[case("Bearer abc", Some("abc"))]
    #[case("bearer   abc  ", Some("abc"))]
    #[case("Basic abc", None)]
    #[case("Bearer ", None)]
    #[case("abc", None)]
    fn bearer_parsing(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_bearer(header), expected);
    }
}
