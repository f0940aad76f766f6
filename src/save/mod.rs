//! Persisted progress: the level to resume and the procedural seed.

use std::io::ErrorKind;
use std::path::Path;

use bevy::log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SaveError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub current_level: u32,
    pub seed: u64,
}

impl SaveData {
    pub const fn new(current_level: u32, seed: u64) -> Self {
        Self {
            current_level,
            seed,
        }
    }

    /// Level 1 with a fresh random seed.
    pub fn fresh() -> Self {
        Self::new(1, rand::rng().random())
    }

    pub const fn completed_levels(&self) -> u32 {
        self.current_level.saturating_sub(1)
    }

    pub fn parse(json: &str) -> Result<Self, SaveError> {
        let data: Self = serde_json::from_str(json)?;
        if data.current_level == 0 {
            return Err(SaveError::InvalidLevel(data.current_level));
        }
        Ok(data)
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, SaveError> {
        let json = std::fs::read_to_string(path)?;
        Self::parse(&json)
    }

    pub fn store(&self, path: &Path) -> Result<(), SaveError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Loads progress, falling back to [`SaveData::fresh`] when the file is
    /// missing or unusable. Corrupt data is never partially applied.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(data) => {
                info!(
                    "resuming at level {} ({} completed)",
                    data.current_level,
                    data.completed_levels()
                );
                data
            }
            Err(SaveError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                info!("no save at {}, starting fresh", path.display());
                Self::fresh()
            }
            Err(err) => {
                warn!("discarding save at {}: {err}", path.display());
                Self::fresh()
            }
        }
    }
}
