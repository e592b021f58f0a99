use crate::config::ExerciseConfig;
use crate::health::{ExerciseMetrics, ExerciseSnapshot, ExerciseType};
use crate::session::ExerciseService;
use crate::uniffi_interface::errors::PulseError;
use crate::uniffi_interface::objects::ExerciseSession;
use log::*;
use std::env;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Entry point for the mobile app: one exercise session slot plus its settings.
#[derive(uniffi::Object)]
pub struct HealthServices {
    service: Arc<ExerciseService>,
    /// Id of the session a `start_exercise` call is still waiting on.
    warming_up: Mutex<Option<String>>,
}

// Foreign executors cannot drive tokio timers, so work hops onto the global runtime.
async fn on_runtime<F, T>(fut: F) -> Result<T, PulseError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let rt = crate::runtime::init_global_runtime_blocking();
    Ok(rt.spawn(fut).await?)
}

fn wrap(snapshot: Option<ExerciseSnapshot>) -> Option<Arc<ExerciseSession>> {
    snapshot.map(|s| Arc::new(ExerciseSession::from(s)))
}

/// Cancels a warm-up whose `start_exercise` future was dropped by the caller.
struct CancelOnDrop {
    service: Arc<ExerciseService>,
    id: Option<String>,
}

impl CancelOnDrop {
    fn disarm(mut self) {
        self.id = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        debug!("start_exercise for {} dropped before activation", id);
        let service = Arc::clone(&self.service);
        crate::runtime::init_global_runtime_blocking().spawn(async move {
            service.cancel_preparing(&id).await;
        });
    }
}

impl HealthServices {
    fn from_config(config: ExerciseConfig) -> Arc<Self> {
        Arc::new(Self {
            service: Arc::new(ExerciseService::new(config)),
            warming_up: Mutex::new(None),
        })
    }

    fn from_lookup<F>(lookup: F) -> Result<Arc<Self>, PulseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::from_config(ExerciseConfig::from_lookup(lookup)?))
    }
}

#[uniffi::export]
impl HealthServices {
    /// Settings come from `PULSE_*` environment variables over the defaults.
    /// A malformed variable is reported rather than ignored.
    #[uniffi::constructor]
    pub fn new() -> Result<Arc<Self>, PulseError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    #[uniffi::constructor]
    pub fn with_settings(warmup_ms: u64, available: bool) -> Arc<Self> {
        Self::from_config(ExerciseConfig {
            warmup: Duration::from_millis(warmup_ms),
            available,
            ..Default::default()
        })
    }

    pub fn is_available(&self) -> bool {
        self.service.is_available()
    }

    pub fn supported_exercise_types(&self) -> Vec<ExerciseType> {
        self.service.supported_types()
    }

    pub fn sample_interval_ms(&self) -> u64 {
        u64::try_from(self.service.config().sample_interval.as_millis()).unwrap_or(u64::MAX)
    }

    /// Resolves once the new session is ACTIVE. Dropping the returned future
    /// or calling [`HealthServices::cancel_start`] abandons the warm-up.
    pub async fn start_exercise(
        &self,
        exercise_type: ExerciseType,
    ) -> Result<Arc<ExerciseSession>, PulseError> {
        debug!("Starting exercise: {}", exercise_type);
        let service = Arc::clone(&self.service);
        let pending = on_runtime(async move { service.start(exercise_type).await }).await??;

        let id = pending.session_id().to_string();
        *self.warming_up.lock().await = Some(id.clone());
        let guard = CancelOnDrop {
            service: Arc::clone(&self.service),
            id: Some(id.clone()),
        };

        let outcome = on_runtime(pending.wait()).await;
        guard.disarm();

        let mut warming_up = self.warming_up.lock().await;
        if warming_up.as_deref() == Some(id.as_str()) {
            *warming_up = None;
        }
        drop(warming_up);

        Ok(Arc::new(ExerciseSession::from(outcome??)))
    }

    /// Discards a session still warming up. Returns `None` once it is ACTIVE.
    pub async fn cancel_start(&self) -> Result<Option<Arc<ExerciseSession>>, PulseError> {
        let id = self.warming_up.lock().await.take();
        let Some(id) = id else {
            debug!("cancel_start ignored, no start in progress");
            return Ok(None);
        };
        let service = Arc::clone(&self.service);
        Ok(wrap(on_runtime(async move { service.cancel_preparing(&id).await }).await?))
    }

    pub async fn pause_exercise(&self) -> Result<Option<Arc<ExerciseSession>>, PulseError> {
        let service = Arc::clone(&self.service);
        Ok(wrap(on_runtime(async move { service.pause().await }).await?))
    }

    pub async fn resume_exercise(&self) -> Result<Option<Arc<ExerciseSession>>, PulseError> {
        let service = Arc::clone(&self.service);
        Ok(wrap(on_runtime(async move { service.resume().await }).await?))
    }

    pub async fn end_exercise(&self) -> Result<Option<Arc<ExerciseSession>>, PulseError> {
        let service = Arc::clone(&self.service);
        Ok(wrap(on_runtime(async move { service.end().await }).await?))
    }

    pub async fn current_exercise(&self) -> Result<Option<Arc<ExerciseSession>>, PulseError> {
        let service = Arc::clone(&self.service);
        Ok(wrap(on_runtime(async move { service.current().await }).await?))
    }

    pub async fn update_metrics(&self) -> Result<Option<ExerciseMetrics>, PulseError> {
        let service = Arc::clone(&self.service);
        on_runtime(async move { service.sample().await }).await
    }
}
