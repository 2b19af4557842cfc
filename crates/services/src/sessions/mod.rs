mod host;
mod plan;
mod progress;
mod quiz;

// Public API of the session subsystem.
pub use host::{HostStep, SessionHost};
pub use plan::PlanTracker;
pub use progress::QuizProgress;
pub use quiz::{QuizPhase, QuizSession};
