use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use study_core::model::{MaterialId, Quiz, QuizId, QuizResult, QuizResultId, UserId};

use super::SqliteRepository;
use super::mapping::{
    conn, from_json, id_i64, material_id_to_i64, quiz_id_from_i64, quiz_result_id_from_i64, ser,
    to_json, u32_from_i64, user_id_from_str,
};
use crate::repository::{QuizRepository, QuizResultRecord, StorageError};

fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResultRecord, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let answers: String = row.try_get("answers").map_err(ser)?;
    Ok(QuizResultRecord {
        id: quiz_result_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        quiz_id: quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        user_id: user_id_from_str(&user_id)?,
        result: QuizResult {
            score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
            total_questions: u32_from_i64(
                "total_questions",
                row.try_get::<i64, _>("total_questions").map_err(ser)?,
            )?,
            answers: from_json(&answers)?,
            completed_at: row.try_get("completed_at").map_err(ser)?,
        },
    })
}

#[async_trait]
impl QuizRepository for SqliteRepository {
    async fn save_quiz(
        &self,
        user: UserId,
        material_id: Option<MaterialId>,
        quiz: &Quiz,
        created_at: DateTime<Utc>,
    ) -> Result<QuizId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quizzes (user_id, material_id, body, created_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user.to_string())
        .bind(material_id_to_i64(material_id)?)
        .bind(to_json(quiz)?)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        quiz_id_from_i64(res.last_insert_rowid())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let row = sqlx::query("SELECT body FROM quizzes WHERE id = ?1")
            .bind(id_i64("quiz_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let body: String = row.try_get("body").map_err(ser)?;
        let quiz: Quiz = from_json(&body)?;
        Ok(quiz.with_id(id))
    }

    async fn save_quiz_result(
        &self,
        user: UserId,
        quiz_id: QuizId,
        result: &QuizResult,
    ) -> Result<QuizResultId, StorageError> {
        let quiz_id = id_i64("quiz_id", quiz_id.value())?;
        let exists = sqlx::query("SELECT 1 FROM quizzes WHERE id = ?1")
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    user_id, quiz_id, score, total_questions, answers, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user.to_string())
        .bind(quiz_id)
        .bind(i64::from(result.score))
        .bind(i64::from(result.total_questions))
        .bind(to_json(&result.answers)?)
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        quiz_result_id_from_i64(res.last_insert_rowid())
    }

    async fn list_quiz_results(
        &self,
        user: UserId,
    ) -> Result<Vec<QuizResultRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, quiz_id, score, total_questions, answers, completed_at
                FROM quiz_results
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }
}
