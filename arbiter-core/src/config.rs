//! Recognized configuration options (§6) as plain data.
//!
//! Turning a config file or environment into this struct is out of scope for
//! the core; `from_env` only reads the two connection strings every binary
//! needs, in the same direct `std::env::var` idiom this codebase already
//! uses for its own database connection setup.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub workers: WorkersConfig,
    pub queue: QueueConfig,
    pub cache: CacheConfig,
    pub lock: LockConfig,
    pub database_url: String,
    pub coordination_url: String,
}

#[derive(Debug, Clone)]
pub struct WorkersConfig {
    pub min: usize,
    pub max: usize,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub stuck_threshold: Duration,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        let timeout = Duration::from_secs(30);
        Self {
            min: 2,
            max: 16,
            timeout,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(200),
            stuck_threshold: timeout * 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub claim_block: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            claim_block: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub match_ttl_active: Duration,
    pub match_ttl_terminal: Duration,
    pub tournament_ttl: Duration,
    pub leaderboard_refresh: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            match_ttl_active: Duration::from_secs(5 * 60),
            match_ttl_terminal: Duration::from_secs(24 * 60 * 60),
            tournament_ttl: Duration::from_secs(60 * 60),
            leaderboard_refresh: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LockConfig {
    pub default_ttl: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(10),
            retry_attempts: 5,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: WorkersConfig::default(),
            queue: QueueConfig::default(),
            cache: CacheConfig::default(),
            lock: LockConfig::default(),
            database_url: String::new(),
            coordination_url: String::new(),
        }
    }
}

impl Config {
    /// Reads the two connection strings from the environment, keeping every
    /// other field at its documented default.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            coordination_url: std::env::var("COORDINATION_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1/".to_string()),
            ..Self::default()
        }
    }
}
