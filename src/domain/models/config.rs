//! Application configuration model.

use serde::{Deserialize, Serialize};

/// Top-level configuration, merged by the loader from defaults, the YAML
/// config file, and `TALLYBOT_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path (or `sqlite::memory:` for ephemeral use)
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ".tallybot/tallybot.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Bonus-cascade recursion budget for single-event triggers.
    pub cascade_depth: u32,
    /// Bonus-cascade recursion budget after a bulk import, which can touch
    /// arbitrary historical dates.
    pub import_cascade_depth: u32,
    /// Grace period for draining in-flight per-user chains on shutdown.
    pub drain_grace_seconds: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            cascade_depth: 6,
            import_cascade_depth: 365,
            drain_grace_seconds: 10,
        }
    }
}
