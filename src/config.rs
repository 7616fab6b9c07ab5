use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::domain::Threshold;
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub threshold: Threshold,
    /// Days ahead covered by `/suggestions` when the caller gives none.
    pub suggestion_horizon_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://attendance.db".to_string(),
            max_connections: 5,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            threshold: Threshold::DEFAULT,
            suggestion_horizon_days: 7,
        }
    }
}

impl AppConfig {
    /// Reads settings from the environment, falling back to defaults for unset keys.
    pub fn new_from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections);
        let bind_addr = parse_var("BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let threshold = match parse_var::<i64>("ATTENDANCE_THRESHOLD")? {
            Some(percent) => Threshold::new(percent).map_err(|e| AppError::Config(e.to_string()))?,
            None => defaults.threshold,
        };
        let suggestion_horizon_days =
            parse_var("SUGGESTION_HORIZON_DAYS")?.unwrap_or(defaults.suggestion_horizon_days);

        Ok(Self {
            database_url,
            max_connections,
            bind_addr,
            threshold,
            suggestion_horizon_days,
        })
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}
