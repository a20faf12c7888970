use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use rally_core::rules::DAILY_INTEREST_LIMIT;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub daily_interest_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("RALLY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("RALLY_JWT_SECRET is unset or still a placeholder; it must match the login service's secret");
        }

        let host = std::env::var("RALLY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("RALLY_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("RALLY_PORT must be a port number")?;
        let db_path: PathBuf = std::env::var("RALLY_DB_PATH")
            .unwrap_or_else(|_| "rally.db".into())
            .into();
        let daily_interest_limit = match std::env::var("RALLY_DAILY_INTEREST_LIMIT") {
            Ok(v) => v
                .parse()
                .context("RALLY_DAILY_INTEREST_LIMIT must be a non-negative integer")?,
            Err(_) => DAILY_INTEREST_LIMIT,
        };

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            daily_interest_limit,
        })
    }
}
