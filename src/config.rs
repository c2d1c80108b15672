//! Configuration module

use std::env;
use std::net::IpAddr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Store URL; the scheme picks the driver (mysql / sqlite)
    pub database_url: String,

    pub bind_addr: IpAddr,

    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "mysql://root@127.0.0.1:3306/police_log".to_string()),

            bind_addr: env::var("BIND_ADDR")
                .ok()
                .and_then(|a| a.parse().ok())
                .unwrap_or(IpAddr::from([0, 0, 0, 0])),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        }
    }
}
