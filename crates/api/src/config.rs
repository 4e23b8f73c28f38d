//! Application configuration loaded from environment variables.

use common::Money;
use domain::PricingConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string; in-memory store when unset
/// - `SHIPPING_FLAT_CENTS` — flat shipping charge (default: `0`)
/// - `TAX_RATE_BASIS_POINTS` — flat tax multiplier (default: `0`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub shipping_flat_cents: i64,
    pub tax_rate_basis_points: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            shipping_flat_cents: std::env::var("SHIPPING_FLAT_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            tax_rate_basis_points: std::env::var("TAX_RATE_BASIS_POINTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the pricing configuration injected into the executor.
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig::new(
            Money::from_cents(self.shipping_flat_cents),
            self.tax_rate_basis_points,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            shipping_flat_cents: 0,
            tax_rate_basis_points: 0,
        }
    }
}
