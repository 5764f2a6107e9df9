use quiz_core::model::{ProgressRecord, ProgressStatus, QuestionId};

use super::SqliteRepository;
use super::mapping::{conn, count_from_i64, map_progress_row, question_id_to_i64, status_to_i64};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, id: QuestionId) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT question_id, status, user_answer, is_marked
            FROM progress WHERE question_id = ?1
            ",
        )
        .bind(question_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress (question_id, status, user_answer, is_marked)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(question_id) DO UPDATE SET
                status = excluded.status,
                user_answer = excluded.user_answer,
                is_marked = excluded.is_marked
            ",
        )
        .bind(question_id_to_i64(record.question_id)?)
        .bind(status_to_i64(record.status))
        .bind(record.user_answer.as_str())
        .bind(i64::from(record.is_marked))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id, status, user_answer, is_marked
            FROM progress
            ORDER BY question_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn list_mistake_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT progress.question_id, progress.status, progress.user_answer, progress.is_marked
            FROM progress
            JOIN mistakes ON mistakes.question_id = progress.question_id
            ORDER BY progress.question_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn count_answered(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM progress WHERE status > 0")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        count_from_i64(count)
    }

    async fn count_with_status(&self, status: ProgressStatus) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM progress WHERE status = ?1")
            .bind(status_to_i64(status))
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        count_from_i64(count)
    }
}
