use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::AuthSettings;

pub const TOKEN_ISSUER: &str = "motorpool";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("api_key is required")]
    MissingKey,
    #[error("invalid api key")]
    InvalidKey,
    #[error("invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Exchanges the static API key for short-lived HS256 bearer tokens.
#[derive(Clone)]
pub struct AuthService {
    api_key: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(api_key: impl Into<String>, jwt_secret: &str, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        Self {
            api_key: api_key.into(),
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            token_ttl,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            settings.api_key.clone(),
            &settings.jwt_secret,
            settings.token_ttl,
        )
    }

    pub fn exchange(&self, api_key: &str) -> Result<String, AuthError> {
        if api_key.is_empty() {
            return Err(AuthError::MissingKey);
        }
        if api_key
            .as_bytes()
            .ct_eq(self.api_key.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(AuthError::InvalidKey);
        }

        self.issue_at(OffsetDateTime::now_utc())
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }

    fn issue_at(&self, issued_at: OffsetDateTime) -> Result<String, AuthError> {
        let iat = issued_at.unix_timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            iss: TOKEN_ISSUER.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Signing)
    }
}
