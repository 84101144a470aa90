use actix_web::dev::Server;
use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use sqlx::SqlitePool;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{PasswordHasher, RefreshTokenRegistry, TokenIssuer};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{health_check, login, profile, refresh, register};
use crate::store::UserStore;

pub fn run(
    listener: TcpListener,
    pool: SqlitePool,
    settings: &Settings,
    registry: Arc<dyn RefreshTokenRegistry>,
) -> Result<Server, std::io::Error> {
    let issuer = TokenIssuer::new(&settings.jwt);
    let hasher = PasswordHasher::new(settings.effective_hashing_cost(), settings.hashing.pepper.clone())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let store = web::Data::new(UserStore::new(pool));
    let hasher = web::Data::new(hasher);
    let issuer_data = web::Data::new(issuer.clone());
    let registry: web::Data<dyn RefreshTokenRegistry> = web::Data::from(registry);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(LoggerMiddleware)
            .wrap(Logger::new("%r %s %Dms"))
            // Shared state
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(store.clone())
            .app_data(hasher.clone())
            .app_data(issuer_data.clone())
            .app_data(registry.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            // Protected routes
            .service(
                web::resource("/profile")
                    .wrap(JwtMiddleware::new(issuer.clone()))
                    .route(web::get().to(profile)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Malformed or mistyped JSON bodies are validation failures, not 500s.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
}
