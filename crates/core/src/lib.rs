#![forbid(unsafe_code)]

pub mod model;
pub mod progress;
pub mod scoring;
pub mod time;

pub use progress::PlanProgress;
pub use scoring::{QuestionScore, ScoreReport, score};
pub use time::Clock;
