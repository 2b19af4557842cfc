use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use study_core::model::{Material, MaterialId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, material_id_from_i64, ser, user_id_from_str};
use crate::repository::{MaterialRecord, MaterialRepository, StorageError};

fn map_material_row(row: &sqlx::sqlite::SqliteRow) -> Result<MaterialRecord, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    Ok(MaterialRecord {
        id: material_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id: user_id_from_str(&user_id)?,
        title: row.try_get("title").map_err(ser)?,
        content_preview: row.try_get("content_preview").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

#[async_trait]
impl MaterialRepository for SqliteRepository {
    async fn save_material(
        &self,
        user: UserId,
        material: &Material,
        created_at: DateTime<Utc>,
    ) -> Result<MaterialId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO materials (user_id, title, content, content_preview, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(user.to_string())
        .bind(material.title())
        .bind(material.content())
        .bind(material.preview())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        material_id_from_i64(res.last_insert_rowid())
    }

    async fn list_materials(&self, user: UserId) -> Result<Vec<MaterialRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, title, content_preview, created_at
                FROM materials
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_material_row).collect()
    }
}
