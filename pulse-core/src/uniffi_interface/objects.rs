use crate::health::{
    ExerciseMetrics, ExerciseSnapshot, ExerciseStatus, ExerciseType, HealthDataType,
};
use crate::session::{ExerciseSummary, format_clock};
use chrono::{DateTime, Utc};

/// Read-only view of a session snapshot for the mobile side.
#[derive(uniffi::Object)]
pub struct ExerciseSession {
    snapshot: ExerciseSnapshot,
}

fn epoch_ms(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

#[uniffi::export]
impl ExerciseSession {
    pub fn id(&self) -> String {
        self.snapshot.id.clone()
    }

    pub fn exercise_type(&self) -> ExerciseType {
        self.snapshot.exercise_type
    }

    pub fn status(&self) -> ExerciseStatus {
        self.snapshot.status
    }

    pub fn start_time_ms(&self) -> i64 {
        epoch_ms(self.snapshot.start_time)
    }

    pub fn end_time_ms(&self) -> Option<i64> {
        self.snapshot.end_time.map(epoch_ms)
    }

    pub fn metrics(&self) -> ExerciseMetrics {
        self.snapshot.metrics
    }

    pub fn metric(&self, data_type: HealthDataType) -> f64 {
        self.snapshot.metrics.value(data_type)
    }

    pub fn duration_ms(&self) -> i64 {
        self.snapshot.duration_ms
    }

    pub fn active_duration_ms(&self) -> i64 {
        self.snapshot.active_duration_ms
    }

    /// Elapsed wall-clock time as `MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(ExerciseSummary::from(&self.snapshot).duration_seconds)
    }

    pub fn summary(&self) -> String {
        ExerciseSummary::from(&self.snapshot).to_string()
    }
}

impl From<ExerciseSnapshot> for ExerciseSession {
    fn from(snapshot: ExerciseSnapshot) -> Self {
        ExerciseSession { snapshot }
    }
}
