use crate::cycle::TimeCycle;
use crate::persistence::{PersistenceError, PersistenceResult};
use crate::resource::{BASE_LANE_COUNT, MAX_BASE_LANES};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Environment variable naming a JSON metadata file to start from.
pub const CONFIG_ENV_VAR: &str = "ROTATION_TOOL_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMetadata {
    pub board_name: String,
    /// Calendar date that `D1 0000` refers to.
    pub base_date: NaiveDate,
    #[serde(default = "default_base_lane_count")]
    pub base_lane_count: usize,
}

fn default_base_lane_count() -> usize {
    BASE_LANE_COUNT
}

impl Default for BoardMetadata {
    fn default() -> Self {
        Self {
            board_name: "AC Rotation".to_string(),
            base_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            base_lane_count: BASE_LANE_COUNT,
        }
    }
}

impl BoardMetadata {
    pub fn cycle(&self) -> TimeCycle {
        TimeCycle::new(self.base_date)
    }

    pub fn validate(&self) -> PersistenceResult<()> {
        if self.board_name.trim().is_empty() {
            return Err(PersistenceError::InvalidData(
                "board_name must not be empty".into(),
            ));
        }
        if self.base_lane_count == 0 {
            return Err(PersistenceError::InvalidData(
                "base_lane_count must be at least 1".into(),
            ));
        }
        if self.base_lane_count > MAX_BASE_LANES {
            return Err(PersistenceError::InvalidData(format!(
                "base_lane_count must be at most {MAX_BASE_LANES} (got {})",
                self.base_lane_count
            )));
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let file = File::open(path)?;
        let metadata: BoardMetadata = serde_json::from_reader(file)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Metadata from the file named by [`CONFIG_ENV_VAR`], or the defaults
    /// when the variable is unset.
    pub fn from_env() -> PersistenceResult<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}
