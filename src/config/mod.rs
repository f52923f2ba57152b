/*!
 * Configuration Module
 *
 * Handles application configuration loading from environment variables
 * and provides structured access to configuration values.
 */

use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Booking-domain configuration (§6, §10)
    pub booking: BookingConfig,
    /// Security configuration
    pub security: SecurityConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Environment (development, production)
    pub environment: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub acquire_timeout: Duration,
    /// Idle connection timeout in seconds
    pub idle_timeout: Duration,
    /// Maximum connection lifetime in seconds
    pub max_lifetime: Duration,
}

/// Booking-domain configuration — the §6 configuration keys enumerated by
/// name in the spec. This is the one config block C3/C4/C5/C6 can't run
/// without, replacing the teacher's `JwtConfig` one-for-one.
#[derive(Clone)]
pub struct BookingConfig {
    /// How long an option token remains valid after issuance (default 300).
    pub option_token_ttl_seconds: i64,
    /// Granularity the option generator steps its cursor by (default 5).
    pub slot_interval_minutes: i64,
    /// Max number of options returned per availability request (default 20).
    pub options_limit: usize,
    /// IANA timezone name the shop operates in, e.g. "Europe/Rome".
    pub shop_timezone: chrono_tz::Tz,
    /// Minutes before start_datetime a non-staff cancel/reschedule is still
    /// allowed (default 30).
    pub cancel_window_minutes: i64,
    /// HMAC secret for signing/verifying option tokens. Never logged.
    pub(crate) option_token_secret: String,
}

impl BookingConfig {
    /// Get the option-token HMAC secret securely. Named explicitly so
    /// every access site is auditable, matching the teacher's
    /// `EmailConfig::smtp_password` pattern for other secrets.
    pub fn option_token_secret(&self) -> &[u8] {
        self.option_token_secret.as_bytes()
    }
}

// Custom Debug implementation to prevent secret leakage in logs.
impl std::fmt::Debug for BookingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingConfig")
            .field("option_token_ttl_seconds", &self.option_token_ttl_seconds)
            .field("slot_interval_minutes", &self.slot_interval_minutes)
            .field("options_limit", &self.options_limit)
            .field("shop_timezone", &self.shop_timezone)
            .field("cancel_window_minutes", &self.cancel_window_minutes)
            .field("option_token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Security configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Rate-limit burst size (governor).
    pub rate_limit_burst: u32,
    /// Rate-limit replenishment period, in seconds, per token.
    pub rate_limit_period_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing
    /// or contain invalid values.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let shop_timezone_name =
            std::env::var("SHOP_TIMEZONE").unwrap_or_else(|_| "Europe/Rome".to_string());
        let shop_timezone: chrono_tz::Tz = shop_timezone_name
            .parse()
            .map_err(|_| anyhow::anyhow!("SHOP_TIMEZONE '{shop_timezone_name}' is not a valid IANA timezone name"))?;

        let config = Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .unwrap_or(8000),
                environment: std::env::var("ENVIRONMENT")
                    .unwrap_or_else(|_| "development".to_string()),
            },

            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                acquire_timeout: Duration::from_secs(
                    std::env::var("DATABASE_CONNECT_TIMEOUT")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
                idle_timeout: Duration::from_secs(
                    std::env::var("DATABASE_IDLE_TIMEOUT")
                        .unwrap_or_else(|_| "600".to_string())
                        .parse()
                        .unwrap_or(600),
                ),
                max_lifetime: Duration::from_secs(
                    std::env::var("DATABASE_MAX_LIFETIME")
                        .unwrap_or_else(|_| "1800".to_string())
                        .parse()
                        .unwrap_or(1800),
                ),
            },

            booking: BookingConfig {
                option_token_ttl_seconds: std::env::var("OPTION_TOKEN_TTL_SECONDS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
                slot_interval_minutes: std::env::var("SLOT_INTERVAL_MINUTES")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                options_limit: std::env::var("OPTIONS_LIMIT")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
                shop_timezone,
                cancel_window_minutes: std::env::var("CANCEL_WINDOW_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                option_token_secret: std::env::var("OPTION_TOKEN_SECRET")
                    .expect("OPTION_TOKEN_SECRET must be set"),
            },

            security: SecurityConfig {
                rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                rate_limit_period_seconds: std::env::var("RATE_LIMIT_PERIOD_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
            },
        };

        Ok(config)
    }
}
