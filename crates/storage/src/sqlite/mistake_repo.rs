use quiz_core::model::{MistakeEntry, ProgressStatus, QuestionId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, count_from_i64, map_mistake_row, question_id_to_i64, ser, status_to_i64,
};
use crate::repository::{MistakeRepository, StorageError};

#[async_trait::async_trait]
impl MistakeRepository for SqliteRepository {
    async fn record_miss(&self, id: QuestionId) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO mistakes (question_id, count)
            VALUES (?1, 1)
            ON CONFLICT(question_id) DO UPDATE SET count = count + 1
            RETURNING count
            ",
        )
        .bind(question_id_to_i64(id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let count: i64 = row.try_get("count").map_err(ser)?;
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization(format!("invalid mistake count: {count}")))
    }

    async fn get_mistake(&self, id: QuestionId) -> Result<Option<MistakeEntry>, StorageError> {
        let row = sqlx::query("SELECT question_id, count FROM mistakes WHERE question_id = ?1")
            .bind(question_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_mistake_row).transpose()
    }

    async fn list_mistakes(&self) -> Result<Vec<MistakeEntry>, StorageError> {
        let rows = sqlx::query("SELECT question_id, count FROM mistakes ORDER BY question_id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_mistake_row).collect()
    }

    async fn count_mistakes(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mistakes")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        count_from_i64(count)
    }

    async fn count_correct_mistakes(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM mistakes
            JOIN progress ON progress.question_id = mistakes.question_id
            WHERE progress.status = ?1
            ",
        )
        .bind(status_to_i64(ProgressStatus::Correct))
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;
        count_from_i64(count)
    }

    async fn delete_correct_mistakes(&self) -> Result<u64, StorageError> {
        let res = sqlx::query(
            r"
            DELETE FROM mistakes
            WHERE question_id IN (
                SELECT question_id FROM progress WHERE status = ?1
            )
            ",
        )
        .bind(status_to_i64(ProgressStatus::Correct))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected())
    }

    async fn remove_mistake(&self, id: QuestionId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM mistakes WHERE question_id = ?1")
            .bind(question_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(res.rows_affected() > 0)
    }
}
