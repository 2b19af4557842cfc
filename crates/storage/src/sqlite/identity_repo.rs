use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use study_core::model::UserId;

use super::SqliteRepository;
use super::mapping::{conn, ser, user_id_from_str};
use crate::repository::{IdentityRepository, StorageError};

#[async_trait]
impl IdentityRepository for SqliteRepository {
    async fn current_user(&self) -> Result<Option<UserId>, StorageError> {
        let row = sqlx::query("SELECT id FROM users ORDER BY created_at ASC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| {
            let raw: String = row.try_get("id").map_err(ser)?;
            user_id_from_str(&raw)
        })
        .transpose()
    }

    async fn save_user(
        &self,
        user: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO users (id, created_at)
                VALUES (?1, ?2)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(user.to_string())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }
}
