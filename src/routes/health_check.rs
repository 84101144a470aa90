use actix_web::{web, HttpResponse};

use crate::store::UserStore;

/// GET /health_check
///
/// 200 when the credential database answers, 503 otherwise.
pub async fn health_check(store: web::Data<UserStore>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(store.pool()).await {
        Ok(_) => HttpResponse::Ok().finish(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed to reach database");
            HttpResponse::ServiceUnavailable().finish()
        }
    }
}
