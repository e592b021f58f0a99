//! Session module for the simulated exercise session.
//!
//! [`ExerciseService`] holds the one session slot. Lifecycle operations live in
//! `lifecycle`, the metrics tick in `sampling`, and the user-facing summary in
//! `summary`.

mod error;
mod lifecycle;
mod sampling;
mod session;
mod summary;

pub use error::SessionError;
pub use lifecycle::PendingStart;
pub use sampling::STEPS_PER_FLOOR;
pub use session::ExerciseService;
pub use summary::{ExerciseSummary, format_clock};
