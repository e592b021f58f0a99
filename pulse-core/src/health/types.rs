use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name any variant of one of the health enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

/// Case-insensitive match of `s` against the names of `all`.
fn lookup_name<T: Copy>(
    all: &[T],
    name: fn(&T) -> &'static str,
    kind: &'static str,
    s: &str,
) -> Result<T, UnknownName> {
    let wanted = s.trim();
    all.iter()
        .find(|t| name(t).eq_ignore_ascii_case(wanted))
        .copied()
        .ok_or_else(|| UnknownName {
            kind,
            value: s.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseType {
    Running,
    Walking,
    Biking,
    Workout,
    Swimming,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 5] = [
        ExerciseType::Running,
        ExerciseType::Walking,
        ExerciseType::Biking,
        ExerciseType::Workout,
        ExerciseType::Swimming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Running => "RUNNING",
            ExerciseType::Walking => "WALKING",
            ExerciseType::Biking => "BIKING",
            ExerciseType::Workout => "WORKOUT",
            ExerciseType::Swimming => "SWIMMING",
        }
    }

    /// The following type in declaration order, wrapping around.
    pub fn next(self) -> ExerciseType {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(&Self::ALL, Self::as_str, "exercise type", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseStatus {
    Preparing,
    Active,
    Paused,
    Ended,
}

impl ExerciseStatus {
    pub const ALL: [ExerciseStatus; 4] = [
        ExerciseStatus::Preparing,
        ExerciseStatus::Active,
        ExerciseStatus::Paused,
        ExerciseStatus::Ended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseStatus::Preparing => "PREPARING",
            ExerciseStatus::Active => "ACTIVE",
            ExerciseStatus::Paused => "PAUSED",
            ExerciseStatus::Ended => "ENDED",
        }
    }
}

impl fmt::Display for ExerciseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseStatus {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(&Self::ALL, Self::as_str, "exercise status", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthDataType {
    HeartRateBpm,
    Distance,
    Calories,
    Steps,
    Floors,
}

impl HealthDataType {
    pub const ALL: [HealthDataType; 5] = [
        HealthDataType::HeartRateBpm,
        HealthDataType::Distance,
        HealthDataType::Calories,
        HealthDataType::Steps,
        HealthDataType::Floors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthDataType::HeartRateBpm => "HEART_RATE_BPM",
            HealthDataType::Distance => "DISTANCE",
            HealthDataType::Calories => "CALORIES",
            HealthDataType::Steps => "STEPS",
            HealthDataType::Floors => "FLOORS",
        }
    }
}

impl fmt::Display for HealthDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthDataType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(&Self::ALL, Self::as_str, "health data type", s)
    }
}

/// A single keyed value, stamped with the time it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDataReading {
    pub data_type: HealthDataType,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Latest values for every [`HealthDataType`] of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExerciseMetrics {
    pub heart_rate_bpm: u32,
    /// Kilometres.
    pub distance: f64,
    pub calories: f64,
    pub steps: u64,
    pub floors: u64,
}

impl ExerciseMetrics {
    pub fn value(&self, data_type: HealthDataType) -> f64 {
        match data_type {
            HealthDataType::HeartRateBpm => f64::from(self.heart_rate_bpm),
            HealthDataType::Distance => self.distance,
            HealthDataType::Calories => self.calories,
            HealthDataType::Steps => self.steps as f64,
            HealthDataType::Floors => self.floors as f64,
        }
    }

    pub fn to_map(&self) -> HashMap<HealthDataType, f64> {
        HealthDataType::ALL
            .iter()
            .map(|dt| (*dt, self.value(*dt)))
            .collect()
    }

    pub fn readings(&self, timestamp: DateTime<Utc>) -> Vec<HealthDataReading> {
        HealthDataType::ALL
            .iter()
            .map(|dt| HealthDataReading {
                data_type: *dt,
                value: self.value(*dt),
                timestamp,
            })
            .collect()
    }
}

/// Copy of a session's state handed out to callers. Never aliases the live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub status: ExerciseStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub metrics: ExerciseMetrics,
    /// Wall-clock milliseconds since `start_time`, paused time included.
    #[serde(rename = "duration")]
    pub duration_ms: i64,
    /// Milliseconds spent in [`ExerciseStatus::Active`] only.
    #[serde(rename = "activeDuration")]
    pub active_duration_ms: i64,
}
