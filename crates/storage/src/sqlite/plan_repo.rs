use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use study_core::PlanProgress;
use study_core::model::{MaterialId, PlanId, StudyPlan, UserId};

use super::SqliteRepository;
use super::mapping::{
    conn, from_json, id_i64, material_id_to_i64, plan_id_from_i64, ser, to_json, u32_from_i64,
};
use crate::repository::{PlanRepository, StorageError};

fn map_plan_row(row: &sqlx::sqlite::SqliteRow) -> Result<StudyPlan, StorageError> {
    let id = plan_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let body: String = row.try_get("body").map_err(ser)?;
    let plan: StudyPlan = from_json(&body)?;
    Ok(plan.with_id(id))
}

#[async_trait]
impl PlanRepository for SqliteRepository {
    async fn save_plan(
        &self,
        user: UserId,
        material_id: Option<MaterialId>,
        plan: &StudyPlan,
        created_at: DateTime<Utc>,
    ) -> Result<PlanId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO study_plans (user_id, material_id, body, created_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user.to_string())
        .bind(material_id_to_i64(material_id)?)
        .bind(to_json(plan)?)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        plan_id_from_i64(res.last_insert_rowid())
    }

    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError> {
        let row = sqlx::query("SELECT id, body FROM study_plans WHERE id = ?1")
            .bind(id_i64("plan_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        map_plan_row(&row)
    }

    async fn list_plans(&self, user: UserId) -> Result<Vec<StudyPlan>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, body
                FROM study_plans
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_plan_row).collect()
    }

    async fn update_plan_progress(
        &self,
        plan_id: PlanId,
        day: u32,
        completed: bool,
    ) -> Result<(), StorageError> {
        let plan_id = id_i64("plan_id", plan_id.value())?;
        let exists = sqlx::query("SELECT 1 FROM study_plans WHERE id = ?1")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        sqlx::query(
            r"
                INSERT INTO plan_progress (plan_id, day, completed)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(plan_id, day) DO UPDATE SET completed = excluded.completed
            ",
        )
        .bind(plan_id)
        .bind(i64::from(day))
        .bind(completed)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_plan_progress(&self, plan_id: PlanId) -> Result<PlanProgress, StorageError> {
        let plan = self.get_plan(plan_id).await?;
        let rows = sqlx::query("SELECT day, completed FROM plan_progress WHERE plan_id = ?1")
            .bind(id_i64("plan_id", plan_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut flags = Vec::with_capacity(rows.len());
        for row in &rows {
            let day = u32_from_i64("day", row.try_get::<i64, _>("day").map_err(ser)?)?;
            let completed: bool = row.try_get("completed").map_err(ser)?;
            flags.push((day, completed));
        }
        Ok(PlanProgress::for_plan(&plan, flags))
    }
}
