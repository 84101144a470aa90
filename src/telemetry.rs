use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::configuration::TelemetrySettings;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. `log` records
/// (actix's access log, `LoggerMiddleware`) are bridged into tracing.
pub fn init_telemetry(settings: &TelemetrySettings) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout).json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
            .init();
    }
}
