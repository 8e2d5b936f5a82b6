use std::env;
use std::time::Duration;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// shared read-only through the application state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and which settings are mandatory.
    pub env: Env,
    // Postgres connection string. Without one, a seeded in-memory store is used.
    pub database_url: Option<String>,
    // Address the HTTP server listens on.
    pub bind_addr: String,
    // Artificial delay added to every in-memory store call.
    pub mock_latency: Duration,
}

/// Env
///
/// Local runs may go without a database; production may not.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for test setup: local, in-memory, no latency.
    fn default() -> Self {
        Self {
            env: Env::Local,
            database_url: None,
            bind_addr: "127.0.0.1:0".to_string(),
            mock_latency: Duration::ZERO,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, failing fast on anything
    /// production cannot run without.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` is missing, and in any environment when
    /// `MOCK_LATENCY_MS` is not a number.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let database_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
            ),
            Env::Local => env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let mock_latency = env::var("MOCK_LATENCY_MS")
            .ok()
            .map(|ms| {
                ms.trim()
                    .parse::<u64>()
                    .expect("FATAL: MOCK_LATENCY_MS must be a whole number of milliseconds")
            })
            .map_or(Duration::ZERO, Duration::from_millis);

        Self {
            env,
            database_url,
            bind_addr,
            mock_latency,
        }
    }
}
