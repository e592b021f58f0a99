//! Health data model and reading sources.

pub mod readings;
mod types;

pub use readings::{RandomReadings, ReadingSource, ReadingTick, ScriptedReadings};
pub use types::{
    ExerciseMetrics, ExerciseSnapshot, ExerciseStatus, ExerciseType, HealthDataReading,
    HealthDataType, UnknownName,
};
