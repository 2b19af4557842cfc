use std::sync::Arc;

use storage::StorageError;
use storage::repository::IdentityRepository;
use study_core::model::UserId;
use tracing::info;

use crate::Clock;

/// Anonymous sign-in: reuse the identity stored on this device or mint one.
#[derive(Clone)]
pub struct IdentityService {
    clock: Clock,
    repo: Arc<dyn IdentityRepository>,
}

impl IdentityService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn IdentityRepository>) -> Self {
        Self { clock, repo }
    }

    /// Returns the current anonymous user, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the identity cannot be read or stored.
    pub async fn sign_in_anonymously(&self) -> Result<UserId, StorageError> {
        if let Some(user) = self.repo.current_user().await? {
            return Ok(user);
        }

        let user = UserId::new_anonymous();
        self.repo.save_user(user, self.clock.now()).await?;
        info!(%user, "created anonymous identity");
        Ok(user)
    }
}
