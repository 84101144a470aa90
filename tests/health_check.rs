//! Integration tests for the health check endpoint

use std::net::TcpListener;
use std::sync::Arc;

use authflow::auth::InMemoryRefreshTokenRegistry;
use authflow::configuration::{get_connection_pool, Settings};
use authflow::startup::run;

async fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = Settings::for_tests();
    let pool = get_connection_pool(&settings)
        .await
        .expect("Failed to open in-memory database");

    let registry = Arc::new(InMemoryRefreshTokenRegistry::new());
    let server = run(listener, pool, &settings, registry).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let address = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}
