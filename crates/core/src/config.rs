use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_POINTS: i64 = 201;
pub const DEFAULT_DROP_POINTS: i64 = 20;
const MIN_DROP_POINTS: i64 = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub max_points: i64,
    pub drop_points: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("max points must be positive (got {0})")]
    MaxPoints(i64),
    #[error("drop points must be between 1 and {max} (got {drop})")]
    DropPoints { drop: i64, max: i64 },
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            drop_points: DEFAULT_DROP_POINTS,
        }
    }
}

impl GameSettings {
    pub fn new(max_points: i64, drop_points: i64) -> Result<Self, SettingsError> {
        let settings = Self {
            max_points,
            drop_points,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Settings with the drop penalty derived from the ceiling.
    pub fn with_suggested_drop(max_points: i64) -> Result<Self, SettingsError> {
        Self::new(max_points, suggested_drop_points(max_points))
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_points <= 0 {
            return Err(SettingsError::MaxPoints(self.max_points));
        }
        if self.drop_points <= 0 || self.drop_points > self.max_points {
            return Err(SettingsError::DropPoints {
                drop: self.drop_points,
                max: self.max_points,
            });
        }
        Ok(())
    }
}

/// `max(20, ceil(max_points * 0.1))`, computed without floats.
pub fn suggested_drop_points(max_points: i64) -> i64 {
    let tenth = if max_points <= 0 {
        0
    } else {
        (max_points + 9) / 10
    };
    tenth.max(MIN_DROP_POINTS)
}
