//! Start, pause, resume and end.

use crate::health::{ExerciseSnapshot, ExerciseStatus, ExerciseType};
use crate::session::error::SessionError;
use crate::session::session::{ActiveExercise, ExerciseService, Slot};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A start that is still warming up.
///
/// The session already occupies the slot in PREPARING. [`PendingStart::wait`]
/// resolves once it turns ACTIVE; [`PendingStart::cancel`] abandons it.
/// Dropping the handle leaves the warm-up running.
pub struct PendingStart {
    id: String,
    preparing: ExerciseSnapshot,
    warmup: JoinHandle<Option<ExerciseSnapshot>>,
    slot: Arc<Mutex<Slot>>,
}

impl PendingStart {
    pub fn session_id(&self) -> &str {
        &self.id
    }

    /// The session as it was when created.
    pub fn preparing(&self) -> &ExerciseSnapshot {
        &self.preparing
    }

    pub async fn wait(self) -> Result<ExerciseSnapshot, SessionError> {
        match self.warmup.await {
            Ok(Some(active)) => Ok(active),
            Ok(None) => Err(SessionError::StartAbandoned { id: self.id }),
            Err(e) => {
                warn!("Warm-up for {} did not complete: {}", self.id, e);
                Err(SessionError::StartAbandoned { id: self.id })
            }
        }
    }

    /// Stops the warm-up and clears the slot if it still holds this session in
    /// PREPARING. Returns the discarded session, or `None` if it had already
    /// become active or left the slot.
    pub async fn cancel(self) -> Option<ExerciseSnapshot> {
        self.warmup.abort();
        discard_preparing(&self.slot, &self.id).await
    }
}

async fn discard_preparing(slot: &Mutex<Slot>, id: &str) -> Option<ExerciseSnapshot> {
    let mut slot = slot.lock().await;
    let still_preparing = slot
        .current
        .as_ref()
        .is_some_and(|e| e.id == id && e.status == ExerciseStatus::Preparing);
    if !still_preparing {
        debug!("Cancel for {} ignored, session is no longer preparing", id);
        return None;
    }

    let mut exercise = slot.current.take()?;
    exercise.finish(Utc::now());
    info!("Cancelled exercise session {} during warm-up", id);
    Some(exercise.snapshot())
}

async fn warm_up(
    slot: Arc<Mutex<Slot>>,
    id: String,
    delay: Duration,
) -> Option<ExerciseSnapshot> {
    tokio::time::sleep(delay).await;

    let mut slot = slot.lock().await;
    match slot.current.as_mut() {
        Some(exercise) if exercise.id == id && exercise.status == ExerciseStatus::Preparing => {
            exercise.activate();
            info!("Exercise session {} is active", id);
            Some(exercise.snapshot())
        }
        _ => {
            debug!("Warm-up for {} finished after the session left the slot", id);
            None
        }
    }
}

impl ExerciseService {
    /// Put a new session of `exercise_type` in the slot and begin warming up.
    pub async fn start(&self, exercise_type: ExerciseType) -> Result<PendingStart, SessionError> {
        if !self.config.available {
            warn!("Refusing to start {}: health services unavailable", exercise_type);
            return Err(SessionError::Unavailable);
        }

        let mut slot = self.slot.lock().await;
        if let Some(existing) = slot.current.as_ref() {
            warn!(
                "Refusing to start {}: session {} is {}",
                exercise_type, existing.id, existing.status
            );
            return Err(SessionError::AlreadyInProgress {
                id: existing.id.clone(),
            });
        }

        let exercise = ActiveExercise::new(exercise_type, Utc::now());
        let id = exercise.id.clone();
        let preparing = exercise.snapshot();
        slot.current = Some(exercise);
        drop(slot);

        info!(
            "Preparing {} session {}, warm-up {:?}",
            exercise_type, id, self.config.warmup
        );
        let warmup = tokio::spawn(warm_up(
            Arc::clone(&self.slot),
            id.clone(),
            self.config.warmup,
        ));

        Ok(PendingStart {
            id,
            preparing,
            warmup,
            slot: Arc::clone(&self.slot),
        })
    }

    /// [`ExerciseService::start`] followed by waiting for the session to turn ACTIVE.
    pub async fn start_and_wait(
        &self,
        exercise_type: ExerciseType,
    ) -> Result<ExerciseSnapshot, SessionError> {
        self.start(exercise_type).await?.wait().await
    }

    /// Cancel the start of session `id` without holding its [`PendingStart`].
    /// Only a session still in PREPARING is discarded; its warm-up then finds
    /// the slot changed and reports [`SessionError::StartAbandoned`].
    pub async fn cancel_preparing(&self, id: &str) -> Option<ExerciseSnapshot> {
        discard_preparing(&self.slot, id).await
    }

    pub async fn pause(&self) -> Option<ExerciseSnapshot> {
        let mut slot = self.slot.lock().await;
        let Some(exercise) = slot
            .current
            .as_mut()
            .filter(|e| e.status == ExerciseStatus::Active)
        else {
            debug!("pause ignored, no active session");
            return None;
        };
        exercise.suspend();
        debug!("Paused exercise session {}", exercise.id);
        Some(exercise.snapshot())
    }

    pub async fn resume(&self) -> Option<ExerciseSnapshot> {
        let mut slot = self.slot.lock().await;
        let Some(exercise) = slot
            .current
            .as_mut()
            .filter(|e| e.status == ExerciseStatus::Paused)
        else {
            debug!("resume ignored, no paused session");
            return None;
        };
        exercise.activate();
        debug!("Resumed exercise session {}", exercise.id);
        Some(exercise.snapshot())
    }

    /// Finish whatever session is in the slot and clear it.
    pub async fn end(&self) -> Option<ExerciseSnapshot> {
        let mut slot = self.slot.lock().await;
        let Some(mut exercise) = slot.current.take() else {
            debug!("end ignored, slot is empty");
            return None;
        };
        exercise.finish(Utc::now());
        info!(
            "Ended exercise session {} after {} ms",
            exercise.id, exercise.duration_ms
        );
        Some(exercise.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExerciseConfig;
    use crate::health::{ExerciseMetrics, ScriptedReadings};

    fn service() -> ExerciseService {
        ExerciseService::with_readings(ExerciseConfig::default(), ScriptedReadings::new(vec![]))
    }

    #[tokio::test(start_paused = true)]
    async fn start_becomes_active_with_fresh_id() {
        let service = service();
        let mut seen = Vec::new();
        for ty in ExerciseType::ALL {
            let pending = service.start(ty).await.unwrap();
            assert_eq!(pending.preparing().status, ExerciseStatus::Preparing);
            assert_eq!(service.current().await.unwrap().status, ExerciseStatus::Preparing);

            let active = pending.wait().await.unwrap();
            assert_eq!(active.status, ExerciseStatus::Active);
            assert_eq!(active.exercise_type, ty);
            assert_eq!(active.metrics, ExerciseMetrics::default());
            assert!(!seen.contains(&active.id));
            seen.push(active.id);

            service.end().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected() {
        let service = service();
        let first = service.start_and_wait(ExerciseType::Running).await.unwrap();

        let err = service.start(ExerciseType::Biking).await.err().unwrap();
        assert_eq!(err, SessionError::AlreadyInProgress { id: first.id.clone() });

        let current = service.current().await.unwrap();
        assert_eq!(current.id, first.id);
        assert_eq!(current.exercise_type, ExerciseType::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_preparing_is_rejected() {
        let service = service();
        let pending = service.start(ExerciseType::Walking).await.unwrap();
        assert!(matches!(
            service.start(ExerciseType::Walking).await,
            Err(SessionError::AlreadyInProgress { .. })
        ));
        assert!(pending.wait().await.is_ok());
    }

    #[tokio::test]
    async fn unavailable_service_refuses_to_start() {
        let config = ExerciseConfig {
            available: false,
            ..Default::default()
        };
        let service = ExerciseService::with_readings(config, ScriptedReadings::new(vec![]));
        assert!(!service.is_available());
        assert_eq!(
            service.start(ExerciseType::Running).await.err(),
            Some(SessionError::Unavailable)
        );
        assert!(service.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_only_apply_once() {
        let service = service();
        service.start_and_wait(ExerciseType::Running).await.unwrap();

        assert!(service.resume().await.is_none());
        assert_eq!(service.pause().await.unwrap().status, ExerciseStatus::Paused);
        assert!(service.pause().await.is_none());
        assert_eq!(service.current().await.unwrap().status, ExerciseStatus::Paused);

        assert_eq!(service.resume().await.unwrap().status, ExerciseStatus::Active);
        assert!(service.resume().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_while_preparing_is_a_no_op() {
        let service = service();
        let pending = service.start(ExerciseType::Swimming).await.unwrap();
        assert!(service.pause().await.is_none());
        assert!(service.resume().await.is_none());
        assert_eq!(pending.wait().await.unwrap().status, ExerciseStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn end_clears_the_slot() {
        let service = service();
        let active = service.start_and_wait(ExerciseType::Workout).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let ended = service.end().await.unwrap();
        assert_eq!(ended.id, active.id);
        assert_eq!(ended.status, ExerciseStatus::Ended);
        let end_time = ended.end_time.unwrap();
        assert_eq!(
            ended.duration_ms,
            (end_time - ended.start_time).num_milliseconds()
        );

        assert!(service.current().await.is_none());
        assert!(service.end().await.is_none());
        assert!(service.pause().await.is_none());
        assert!(service.sample().await.is_none());

        assert!(service.start(ExerciseType::Running).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_a_preparing_session() {
        let service = service();
        let pending = service.start(ExerciseType::Biking).await.unwrap();
        let id = pending.session_id().to_string();

        let cancelled = pending.cancel().await.unwrap();
        assert_eq!(cancelled.id, id);
        assert_eq!(cancelled.status, ExerciseStatus::Ended);
        assert!(service.current().await.is_none());

        let next = service.start(ExerciseType::Running).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(service.current().await.unwrap().status, ExerciseStatus::Preparing);
        assert_eq!(next.wait().await.unwrap().status, ExerciseStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_warm_up_does_not_touch_a_new_session() {
        let config = ExerciseConfig {
            warmup: Duration::from_millis(1000),
            ..Default::default()
        };
        let service = ExerciseService::with_readings(config, ScriptedReadings::new(vec![]));

        let stale = service.start(ExerciseType::Walking).await.unwrap();
        service.end().await.unwrap();
        let fresh = service.start(ExerciseType::Running).await.unwrap();

        assert!(matches!(
            stale.wait().await,
            Err(SessionError::StartAbandoned { .. })
        ));
        assert_eq!(fresh.wait().await.unwrap().exercise_type, ExerciseType::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_activation_keeps_the_session() {
        let service = service();
        let pending = service.start(ExerciseType::Running).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(pending.cancel().await.is_none());
        assert_eq!(service.current().await.unwrap().status, ExerciseStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_by_id_abandons_the_pending_start() {
        let service = service();
        let pending = service.start(ExerciseType::Walking).await.unwrap();
        let id = pending.session_id().to_string();

        assert!(service.cancel_preparing("exercise-unknown").await.is_none());
        let cancelled = service.cancel_preparing(&id).await.unwrap();
        assert_eq!(cancelled.status, ExerciseStatus::Ended);
        assert_eq!(
            pending.wait().await.err(),
            Some(SessionError::StartAbandoned { id: id.clone() })
        );
        assert!(service.current().await.is_none());

        service.start_and_wait(ExerciseType::Running).await.unwrap();
        assert!(service.cancel_preparing(&id).await.is_none());
        assert_eq!(service.current().await.unwrap().status, ExerciseStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn end_during_warm_up_abandons_the_start() {
        let service = service();
        let pending = service.start(ExerciseType::Running).await.unwrap();

        let ended = service.end().await.unwrap();
        assert_eq!(ended.status, ExerciseStatus::Ended);
        assert_eq!(ended.active_duration_ms, 0);
        assert!(pending.wait().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn active_duration_skips_paused_time() {
        let service = service();
        service.start_and_wait(ExerciseType::Running).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        service.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        service.resume().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let ended = service.end().await.unwrap();
        assert_eq!(ended.active_duration_ms, 15_000);
    }
}
