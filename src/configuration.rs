use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::ConfigError;

/// bcrypt cost used whenever test mode is on.
pub const TEST_HASHING_COST: u32 = 4;

const MIN_HASHING_COST: u32 = 4;
const MAX_HASHING_COST: u32 = 31;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub hashing: HashingSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Lowers the hashing cost and swaps storage for an in-memory database.
    pub test_mode: bool,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

/// JWT signing settings. Access and refresh tokens never share a secret.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
}

// Secrets stay out of Debug output.
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"[redacted]")
            .field("refresh_secret", &"[redacted]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct HashingSettings {
    pub cost: u32,
    pub pepper: String,
}

impl std::fmt::Debug for HashingSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingSettings")
            .field("cost", &self.cost)
            .field("pepper", &"[redacted]")
            .finish()
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    pub level: String,
    pub json: bool,
}

impl Settings {
    /// Settings for tests: in-memory storage, minimum bcrypt cost, fixed secrets.
    pub fn for_tests() -> Self {
        Settings {
            application: ApplicationSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                test_mode: true,
            },
            database: DatabaseSettings {
                url: "sqlite::memory:".to_string(),
            },
            jwt: JwtSettings {
                access_secret: "test-access-secret-at-least-32-characters".to_string(),
                refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
                issuer: "authflow-test".to_string(),
            },
            hashing: HashingSettings {
                cost: TEST_HASHING_COST,
                pepper: "test-pepper".to_string(),
            },
            telemetry: TelemetrySettings {
                level: "debug".to_string(),
                json: false,
            },
        }
    }

    /// bcrypt cost actually used, honoring test mode.
    pub fn effective_hashing_cost(&self) -> u32 {
        if self.application.test_mode {
            TEST_HASHING_COST
        } else {
            self.hashing.cost
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.access_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.access_secret".to_string()));
        }
        if self.jwt.refresh_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.refresh_secret".to_string()));
        }
        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            ));
        }
        if !(MIN_HASHING_COST..=MAX_HASHING_COST).contains(&self.hashing.cost) {
            return Err(ConfigError::InvalidValue(format!(
                "hashing.cost must be between {} and {}",
                MIN_HASHING_COST, MAX_HASHING_COST
            )));
        }
        Ok(())
    }
}

impl DatabaseSettings {
    /// Connection options for the configured database, or a private in-memory
    /// database when `in_memory` is set.
    pub fn connect_options(&self, in_memory: bool) -> Result<SqliteConnectOptions, ConfigError> {
        let url = if in_memory { "sqlite::memory:" } else { self.url.as_str() };
        SqliteConnectOptions::from_str(url)
            .map(|options| options.create_if_missing(true))
            .map_err(|e| ConfigError::InvalidValue(format!("database.url: {}", e)))
    }
}

/// Open the credential database pool.
///
/// An in-memory SQLite database lives only as long as its connection, so in
/// test mode the pool holds exactly one connection that is never recycled.
pub async fn get_connection_pool(settings: &Settings) -> Result<SqlitePool, crate::error::AppError> {
    let in_memory = settings.application.test_mode;
    let options = settings.database.connect_options(in_memory)?;

    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    Ok(pool)
}

/// Load settings from `configuration.yaml`, `APP__*` environment variables and
/// the legacy `JWT_SECRET`, `REFRESH_TOKEN_SECRET`, `SALT_ROUNDS`, `PEPPER`
/// and `TEST_MODE` variables, in increasing order of precedence.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("application.test_mode", false)?
        .set_default("database.url", "sqlite://auth.db")?
        .set_default("jwt.issuer", "authflow")?
        .set_default("hashing.cost", 10)?
        .set_default("hashing.pepper", "")?
        .set_default("telemetry.level", "info")?
        .set_default("telemetry.json", true)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("jwt.access_secret", std::env::var("JWT_SECRET").ok())?
        .set_override_option("jwt.refresh_secret", std::env::var("REFRESH_TOKEN_SECRET").ok())?
        .set_override_option("hashing.cost", parse_env::<u32>("SALT_ROUNDS").map(i64::from))?
        .set_override_option("hashing.pepper", std::env::var("PEPPER").ok())?
        .set_override_option("application.test_mode", parse_env::<bool>("TEST_MODE"))?
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

/// Value of `key` when it is set and parses. Anything else falls through to
/// the file/`APP__` layers and the built-in default.
fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            // Runs before telemetry is initialised.
            eprintln!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
