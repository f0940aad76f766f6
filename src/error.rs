//! Error types for loaders at the edges of the simulation.
//!
//! Nothing inside a tick returns one of these: commands and invariant
//! violations are logged and ignored there. Only configuration, level
//! import and save data parsing can fail.

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// A value parsed but cannot be used.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors raised while importing an editor-built level.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse level document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level document has no player spawn point")]
    MissingPlayerSpawn,

    #[error("level grid {width}x{height} is not playable")]
    InvalidGrid { width: i32, height: i32 },
}

/// Errors raised while reading persisted progress.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to read save file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed save data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("save data holds level {0}, levels start at 1")]
    InvalidLevel(u32),
}
