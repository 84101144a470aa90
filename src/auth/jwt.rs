/// JWT Token Generation and Validation
///
/// `TokenIssuer` mints short-lived access tokens and long-lived refresh
/// tokens, each class signed with its own HS256 secret so a leak of one
/// secret cannot be used to forge the other kind.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Access tokens live for one hour.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 60 * 60;
/// Refresh tokens live for seven days.
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            access: SigningKeys::from_secret(&config.access_secret),
            refresh: SigningKeys::from_secret(&config.refresh_secret),
            issuer: config.issuer.clone(),
        }
    }

    pub fn issue_access_token(&self, subject_id: i64, username: &str) -> Result<String, AppError> {
        self.issue_access_token_at(subject_id, username, Utc::now())
    }

    pub fn issue_refresh_token(&self, subject_id: i64, username: &str) -> Result<String, AppError> {
        self.issue_refresh_token_at(subject_id, username, Utc::now())
    }

    /// Mint an access token as if issued at `issued_at`.
    pub fn issue_access_token_at(
        &self,
        subject_id: i64,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims::new(
            subject_id,
            username.to_string(),
            issued_at,
            ACCESS_TOKEN_TTL_SECONDS,
            self.issuer.clone(),
        );
        sign(&claims, &self.access.encoding)
    }

    /// Mint a refresh token as if issued at `issued_at`.
    pub fn issue_refresh_token_at(
        &self,
        subject_id: i64,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims::new(
            subject_id,
            username.to_string(),
            issued_at,
            REFRESH_TOKEN_TTL_SECONDS,
            self.issuer.clone(),
        );
        sign(&claims, &self.refresh.encoding)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.verify(token, &self.access.decoding)
    }

    /// Checks signature and expiry only. Registry membership is the caller's job.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.verify(token, &self.refresh.decoding)
    }

    fn verify(&self, token: &str, key: &DecodingKey) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("JWT expired");
                    AppError::Auth(AuthError::TokenExpired)
                }
                _ => {
                    tracing::debug!("JWT validation error: {}", e);
                    AppError::Auth(AuthError::TokenInvalid)
                }
            })
    }
}

fn sign(claims: &Claims, key: &EncodingKey) -> Result<String, AppError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}
