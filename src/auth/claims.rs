/// JWT Claims structure
///
/// Payload shared by access and refresh tokens. Which kind a token is
/// depends only on the secret it was signed with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (numeric user id, as a string)
    pub sub: String,
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    /// Unique token id. Keeps two tokens minted in the same second distinct.
    pub jti: String,
}

impl Claims {
    pub fn new(
        subject_id: i64,
        username: String,
        issued_at: DateTime<Utc>,
        expiry_seconds: i64,
        issuer: String,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: subject_id.to_string(),
            username,
            exp: iat + expiry_seconds,
            iat,
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Numeric user id carried in `sub`.
    pub fn subject_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }
}

/// Identity attached to a request once its access token checks out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub subject_id: i64,
    pub username: String,
}

impl TryFrom<&Claims> for AuthenticatedUser {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            subject_id: claims.subject_id()?,
            username: claims.username.clone(),
        })
    }
}
