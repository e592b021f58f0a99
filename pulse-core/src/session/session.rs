use crate::config::ExerciseConfig;
use crate::health::{
    ExerciseMetrics, ExerciseSnapshot, ExerciseStatus, ExerciseType, RandomReadings,
    ReadingSource,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Owns the single exercise session slot and the source of synthetic readings.
///
/// Every operation holds the slot lock for its whole check-and-mutate, so at
/// most one session can ever occupy the slot.
pub struct ExerciseService {
    pub(crate) slot: Arc<Mutex<Slot>>,
    pub(crate) config: ExerciseConfig,
}

pub(crate) struct Slot {
    pub current: Option<ActiveExercise>,
    pub readings: Box<dyn ReadingSource>,
}

/// The live session. Only ever leaves the slot as an [`ExerciseSnapshot`].
pub(crate) struct ActiveExercise {
    pub id: String,
    pub exercise_type: ExerciseType,
    pub status: ExerciseStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub metrics: ExerciseMetrics,
    pub duration_ms: i64,
    accrued_active: Duration,
    active_since: Option<Instant>,
}

impl ActiveExercise {
    pub fn new(exercise_type: ExerciseType, start_time: DateTime<Utc>) -> Self {
        Self {
            id: format!("exercise-{}", Uuid::new_v4().simple()),
            exercise_type,
            status: ExerciseStatus::Preparing,
            start_time,
            end_time: None,
            metrics: ExerciseMetrics::default(),
            duration_ms: 0,
            accrued_active: Duration::ZERO,
            active_since: None,
        }
    }

    pub fn activate(&mut self) {
        self.status = ExerciseStatus::Active;
        self.active_since = Some(Instant::now());
    }

    pub fn suspend(&mut self) {
        self.bank_active_time();
        self.status = ExerciseStatus::Paused;
    }

    pub fn finish(&mut self, end_time: DateTime<Utc>) {
        self.bank_active_time();
        self.status = ExerciseStatus::Ended;
        self.end_time = Some(end_time);
        self.duration_ms = (end_time - self.start_time).num_milliseconds();
    }

    pub fn active_elapsed(&self) -> Duration {
        self.accrued_active + self.active_since.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn snapshot(&self) -> ExerciseSnapshot {
        ExerciseSnapshot {
            id: self.id.clone(),
            exercise_type: self.exercise_type,
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            metrics: self.metrics,
            duration_ms: self.duration_ms,
            active_duration_ms: i64::try_from(self.active_elapsed().as_millis())
                .unwrap_or(i64::MAX),
        }
    }

    fn bank_active_time(&mut self) {
        if let Some(since) = self.active_since.take() {
            self.accrued_active += since.elapsed();
        }
    }
}

impl ExerciseService {
    pub fn new(config: ExerciseConfig) -> Self {
        Self::with_readings(config, RandomReadings::new())
    }

    pub fn with_readings<R>(config: ExerciseConfig, readings: R) -> Self
    where
        R: ReadingSource + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                current: None,
                readings: Box::new(readings),
            })),
            config,
        }
    }

    pub fn config(&self) -> &ExerciseConfig {
        &self.config
    }

    /// Whether the (simulated) platform supports health services.
    pub fn is_available(&self) -> bool {
        self.config.available
    }

    pub fn supported_types(&self) -> Vec<ExerciseType> {
        ExerciseType::ALL.to_vec()
    }

    /// Snapshot of the session in the slot, if any.
    pub async fn current(&self) -> Option<ExerciseSnapshot> {
        self.slot.lock().await.current.as_ref().map(|e| e.snapshot())
    }
}

impl Default for ExerciseService {
    fn default() -> Self {
        Self::new(ExerciseConfig::default())
    }
}
