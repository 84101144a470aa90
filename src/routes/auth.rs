/// Authentication Routes
///
/// Registration, login, access token refresh and the protected profile.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedUser, PasswordHasher, RefreshTokenRegistry, TokenIssuer};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::UserStore;
use crate::validators::{is_valid_password, is_valid_username, required};

/// Registration and login request body
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
}

/// POST /register
///
/// # Errors
/// - 400: username not 3-30 alphanumerics, password not 8-128 characters
/// - 500: username already taken, or storage failure
pub async fn register(
    form: web::Json<CredentialsRequest>,
    store: web::Data<UserStore>,
    hasher: web::Data<PasswordHasher>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let username = is_valid_username(form.username.as_deref())?;
    let password = is_valid_password(form.password.as_deref())?;

    let hasher = hasher.get_ref().clone();
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    let user_id = store.create(&username, &password_hash).await?;

    tracing::info!(user_id = user_id, username = %username, "User registered");

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "User registered".to_string(),
    }))
}

/// POST /login
///
/// Unknown usernames and wrong passwords both fail with the same
/// `INVALID_CREDENTIALS` response.
///
/// # Errors
/// - 400: missing fields, or invalid credentials
/// - 500: storage or hashing failure
pub async fn login(
    form: web::Json<CredentialsRequest>,
    store: web::Data<UserStore>,
    hasher: web::Data<PasswordHasher>,
    issuer: web::Data<TokenIssuer>,
    registry: web::Data<dyn RefreshTokenRegistry>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let username = required("username", form.username.as_deref())?.to_string();
    let password = required("password", form.password.as_deref())?.to_string();

    let hasher = hasher.get_ref().clone();
    let user = match store.find(&username).await {
        Ok(user) => user,
        Err(AppError::Database(DatabaseError::NotFound(_))) => {
            // Same bcrypt work as a wrong password, so timing does not reveal the username.
            web::block(move || hasher.verify_unknown_user(&password)).await??;
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }
        Err(e) => return Err(e),
    };

    let digest = user.password_hash.clone();
    let matches = web::block(move || hasher.verify(&password, &digest)).await??;
    if !matches {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let access_token = issuer.issue_access_token(user.id, &user.username)?;
    let refresh_token = issuer.issue_refresh_token(user.id, &user.username)?;
    registry.register(&refresh_token);

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

/// POST /refresh
///
/// Mints a new access token from a refresh token. The refresh token itself
/// is neither rotated nor re-registered.
///
/// Checks run in order: signature, expiry, registry membership.
///
/// # Errors
/// - 400: token missing
/// - 403: bad signature, expired, or never issued by this process
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    issuer: web::Data<TokenIssuer>,
    registry: web::Data<dyn RefreshTokenRegistry>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let token = required("token", form.token.as_deref())?;

    let claims = issuer.verify_refresh_token(token)?;
    if !registry.is_registered(token) {
        tracing::warn!(subject = %claims.sub, "Unregistered refresh token presented");
        return Err(AppError::Auth(AuthError::TokenNotRegistered));
    }

    let user = AuthenticatedUser::try_from(&claims)?;
    let access_token = issuer.issue_access_token(user.subject_id, &user.username)?;

    tracing::info!(user_id = user.subject_id, "Access token refreshed");

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

/// GET /profile
///
/// Requires `Authorization: Bearer <access token>`; identity is injected by
/// `JwtMiddleware`.
///
/// # Errors
/// - 401 / 403: handled by the middleware
/// - 404: the token's user no longer exists
pub async fn profile(
    user: web::ReqData<AuthenticatedUser>,
    store: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = store.find_by_id(user.subject_id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        id: user.id,
        username: user.username,
    }))
}
