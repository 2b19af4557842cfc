use std::sync::Arc;

use storage::Storage;
use study_core::model::UserId;
use tracing::{info, warn};

use crate::Clock;
use crate::error::AppServicesError;
use crate::extract::{DocumentExtractor, Extractor};
use crate::generation::{ArtifactGenerator, ChatGenerator};
use crate::history::HistoryService;
use crate::identity::IdentityService;
use crate::mirror::PersistenceMirror;
use crate::sessions::SessionHost;

/// Assembles app-facing services around one signed-in user.
///
/// Without a user (sign-in failed or no store) sessions still work, they are
/// just not mirrored.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    generator: Arc<dyn ArtifactGenerator>,
    extractor: Arc<dyn Extractor>,
    persistence: Option<(UserId, Storage)>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the configured generator.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let generator: Arc<dyn ArtifactGenerator> = Arc::new(ChatGenerator::from_env());
        Ok(Self::with_storage(storage, generator, Arc::new(DocumentExtractor), clock).await)
    }

    /// Sign in against `storage`; falls back to unpersisted sessions on failure.
    pub async fn with_storage(
        storage: Storage,
        generator: Arc<dyn ArtifactGenerator>,
        extractor: Arc<dyn Extractor>,
        clock: Clock,
    ) -> Self {
        let identity = IdentityService::new(clock, Arc::clone(&storage.identity));
        let persistence = match identity.sign_in_anonymously().await {
            Ok(user) => {
                info!(%user, "signed in");
                Some((user, storage))
            }
            Err(err) => {
                warn!(error = %err, "anonymous sign-in failed, sessions will not be saved");
                None
            }
        };
        Self {
            clock,
            generator,
            extractor,
            persistence,
        }
    }

    /// Services with no store at all.
    #[must_use]
    pub fn offline(
        generator: Arc<dyn ArtifactGenerator>,
        extractor: Arc<dyn Extractor>,
        clock: Clock,
    ) -> Self {
        Self {
            clock,
            generator,
            extractor,
            persistence: None,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.persistence.as_ref().map(|(user, _)| *user)
    }

    /// A fresh session host for one learner.
    #[must_use]
    pub fn host(&self) -> SessionHost {
        let mirror = match &self.persistence {
            Some((user, storage)) => PersistenceMirror::new(*user, storage.clone()),
            None => PersistenceMirror::disabled(),
        };
        SessionHost::new(
            Arc::clone(&self.generator),
            Arc::clone(&self.extractor),
            mirror,
            self.clock,
        )
    }

    #[must_use]
    pub fn history(&self) -> Option<HistoryService> {
        self.persistence
            .as_ref()
            .map(|(user, storage)| HistoryService::new(*user, storage.clone()))
    }
}
