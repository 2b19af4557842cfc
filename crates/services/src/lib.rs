#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod extract;
pub mod generation;
pub mod history;
pub mod identity;
pub mod mirror;
pub mod sessions;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, ExtractionError, GenerationError, HostError, PlanTrackerError,
    QuizSessionError,
};
pub use extract::{DocumentExtractor, Extractor, PdfExtractor, PlainTextExtractor};
pub use generation::{ArtifactGenerator, ChatGenerator, GeneratorConfig};
pub use history::{HistoryService, PlanHistoryItem};
pub use identity::IdentityService;
pub use mirror::PersistenceMirror;
pub use sessions::{HostStep, PlanTracker, QuizPhase, QuizProgress, QuizSession, SessionHost};
