use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_write_per_min: u32,
    pub rate_read_per_min: u32,

    pub employee_cache_ttl_secs: u64,
}

fn var_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string()),
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_write_per_min: var_or("RATE_WRITE_PER_MIN", 120)?,
            rate_read_per_min: var_or("RATE_READ_PER_MIN", 1000)?,

            employee_cache_ttl_secs: var_or("EMPLOYEE_CACHE_TTL_SECS", 86_400)?, // 24h
        })
    }
}

/// Settings for the terminal front end.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub log_dir: String,
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            api_url: env::var("ATTENDANCE_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_falls_back_to_default() {
        let value: u32 = var_or("ATTENDANCE_TEST_SURELY_UNSET", 42).expect("default");
        assert_eq!(value, 42);
    }
}
