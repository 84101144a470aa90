use std::net::TcpListener;
use std::sync::Arc;

use authflow::auth::InMemoryRefreshTokenRegistry;
use authflow::configuration::{get_configuration, get_connection_pool};
use authflow::startup::run;
use authflow::store::UserStore;
use authflow::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    init_telemetry(&configuration.telemetry);
    tracing::info!(
        test_mode = configuration.application.test_mode,
        hashing_cost = configuration.effective_hashing_cost(),
        "Configuration loaded"
    );

    let pool = get_connection_pool(&configuration).await.map_err(|e| {
        tracing::error!("Failed to open credential database: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database connection error")
    })?;

    UserStore::new(pool.clone()).migrate().await.map_err(|e| {
        tracing::error!("Failed to migrate credential database: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Credential database ready");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // Refresh tokens do not survive a restart.
    let registry = Arc::new(InMemoryRefreshTokenRegistry::new());

    let server = run(listener, pool, &configuration, registry)?;
    server.await
}
