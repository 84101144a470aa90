/// JWT Authentication Middleware
///
/// Gates protected resources on a bearer access token and injects the
/// caller's `AuthenticatedUser` into request extensions.
///
/// - no usable `Authorization: Bearer <token>` header: 401
/// - token present but malformed, badly signed or expired: 403
///
/// Only the `Bearer` scheme carries credentials here. A header with another
/// scheme (`Basic ...`) or extra parts (`Bearer a b`) is treated as if it
/// were absent and gets 401, not 403.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{AuthenticatedUser, TokenIssuer};
use crate::error::{AppError, AuthError};

pub struct JwtMiddleware {
    issuer: TokenIssuer,
}

impl JwtMiddleware {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    issuer: TokenIssuer,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer_token)
            .map(str::to_string);

        let identity = match token {
            None => {
                tracing::debug!(path = %req.path(), "Request without bearer token");
                Err(AppError::Auth(AuthError::MissingToken))
            }
            Some(token) => self
                .issuer
                .verify_access_token(&token)
                .and_then(|claims| AuthenticatedUser::try_from(&claims)),
        };

        match identity {
            Ok(user) => {
                tracing::debug!(
                    subject_id = user.subject_id,
                    username = %user.username,
                    "Access token validated"
                );
                req.extensions_mut().insert(user);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(Error::from(e)) }),
        }
    }
}

/// Token part of a `Bearer <token>` header value. The scheme is matched
/// case-insensitively; any other scheme yields `None`.
fn extract_bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;

    if scheme.eq_ignore_ascii_case("Bearer") && parts.next().is_none() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Settings;
    use actix_web::{http::StatusCode, test as actix_test, web, App, HttpResponse};

    async fn whoami(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
        HttpResponse::Ok().body(user.username.clone())
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&Settings::for_tests().jwt)
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer"), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("BearerToken"), None);
        assert_eq!(extract_bearer_token("Bearer a b"), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let issuer = issuer();
        let token = issuer.issue_access_token(3, "alice").unwrap();
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtMiddleware::new(issuer))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = actix_test::read_body(resp).await;
        assert_eq!(body, "alice");
    }

    #[actix_web::test]
    async fn test_missing_token_is_401() {
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtMiddleware::new(issuer()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/whoami").to_request();
        let err = actix_test::try_call_service(&app, req).await.err().expect("expected error");

        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_garbage_token_is_403() {
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtMiddleware::new(issuer()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTHORIZATION, "Bearer garbage"))
            .to_request();
        let err = actix_test::try_call_service(&app, req).await.err().expect("expected error");

        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_non_bearer_scheme_is_401() {
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/whoami")
                    .wrap(JwtMiddleware::new(issuer()))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        for header in ["Basic dXNlcjpwYXNz", "Bearer a b"] {
            let req = actix_test::TestRequest::get()
                .uri("/whoami")
                .insert_header((AUTHORIZATION, header))
                .to_request();
            let err = actix_test::try_call_service(&app, req).await.err().expect("expected error");

            assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
