use crate::health::{ExerciseMetrics, ExerciseStatus, ReadingTick};
use crate::session::session::ExerciseService;
use chrono::Utc;
use log::{debug, trace};

pub const STEPS_PER_FLOOR: u64 = 20;

impl ExerciseMetrics {
    /// Fold one tick into the running totals. Negative increments count as zero.
    pub(crate) fn advance(&self, tick: &ReadingTick) -> ExerciseMetrics {
        let steps = self.steps.saturating_add(tick.steps);
        ExerciseMetrics {
            heart_rate_bpm: tick.heart_rate_bpm,
            distance: self.distance + tick.distance_km.max(0.0),
            calories: self.calories + tick.calories.max(0.0),
            steps,
            floors: steps / STEPS_PER_FLOOR,
        }
    }
}

impl ExerciseService {
    /// Take one sample of synthetic readings for the active session.
    ///
    /// Meant to be called on the caller's sampling tick. Returns `None` unless
    /// a session is ACTIVE.
    pub async fn sample(&self) -> Option<ExerciseMetrics> {
        let mut guard = self.slot.lock().await;
        let slot = &mut *guard;
        let Some(exercise) = slot
            .current
            .as_mut()
            .filter(|e| e.status == ExerciseStatus::Active)
        else {
            debug!("sample ignored, no active session");
            return None;
        };

        let tick = slot.readings.next_tick();
        exercise.metrics = exercise.metrics.advance(&tick);
        exercise.duration_ms = (Utc::now() - exercise.start_time).num_milliseconds();
        trace!("Sampled {}: {:?}", exercise.id, exercise.metrics);
        Some(exercise.metrics)
    }
}
