//! Application configuration loaded from environment variables.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Economy Parameters ===
    /// Points credited per observed chat message (0 disables the award).
    #[serde(default = "default_message_points")]
    pub message_points: u64,

    /// Balance given to newly created accounts.
    #[serde(default)]
    pub starting_balance: u64,

    /// Default number of entries in the leaderboard.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    // === Shop ===
    /// Path to the `name:price` shop list (one entry per line).
    #[serde(default)]
    pub shop_file: Option<String>,

    // === Storage/Locking ===
    /// Upper bound on keyed-lock acquisition, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_message_points() -> u64 {
    5
}

fn default_leaderboard_size() -> usize {
    10
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.leaderboard_size == 0 {
            return Err("LEADERBOARD_SIZE must be at least 1".to_string());
        }

        if self.lock_timeout_ms == 0 {
            return Err("LOCK_TIMEOUT_MS must be at least 1".to_string());
        }

        if let Some(path) = &self.shop_file {
            if path.trim().is_empty() {
                return Err("SHOP_FILE must not be blank when set".to_string());
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            message_points: default_message_points(),
            starting_balance: 0,
            leaderboard_size: default_leaderboard_size(),
            shop_file: None,
            lock_timeout_ms: default_lock_timeout_ms(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}
