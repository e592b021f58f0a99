//! End-of-exercise summary shown to the user.

use crate::health::{ExerciseSnapshot, ExerciseType};
use serde::Serialize;
use std::fmt;

/// `MM:SS`, minutes not wrapped at the hour.
pub fn format_clock(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseSummary {
    pub exercise_type: ExerciseType,
    pub duration_seconds: u64,
    pub active_seconds: u64,
    pub heart_rate_bpm: u32,
    pub calories: f64,
    pub distance_km: f64,
    pub steps: u64,
}

impl From<&ExerciseSnapshot> for ExerciseSummary {
    fn from(s: &ExerciseSnapshot) -> Self {
        ExerciseSummary {
            exercise_type: s.exercise_type,
            duration_seconds: whole_seconds(s.duration_ms),
            active_seconds: whole_seconds(s.active_duration_ms),
            heart_rate_bpm: s.metrics.heart_rate_bpm,
            calories: s.metrics.calories,
            distance_km: s.metrics.distance,
            steps: s.metrics.steps,
        }
    }
}

fn whole_seconds(ms: i64) -> u64 {
    u64::try_from(ms.max(0) / 1000).unwrap_or(0)
}

impl fmt::Display for ExerciseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Duration: {}", format_clock(self.duration_seconds))?;
        writeln!(f, "Heart Rate: {} bpm", self.heart_rate_bpm)?;
        writeln!(f, "Calories: {:.1} cal", self.calories)?;
        write!(f, "Distance: {:.2} km", self.distance_km)
    }
}
