use quiz_core::model::{Question, QuestionCorrection, QuestionId};

use super::SqliteRepository;
use super::mapping::{conn, count_from_i64, encode_options, map_question_row, question_id_to_i64};
use crate::repository::{QuestionRepository, StorageError};

fn insert_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn count_questions(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        count_from_i64(count)
    }

    async fn insert_bank(&self, questions: &[Question]) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for q in questions {
            let id = question_id_to_i64(q.id)?;
            sqlx::query(
                r"
                INSERT INTO questions (id, kind, content, options, answer, explanation, ai_explanation)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(id)
            .bind(q.kind.as_str())
            .bind(q.content.as_str())
            .bind(encode_options(&q.options)?)
            .bind(q.answer.as_str())
            .bind(q.explanation.as_str())
            .bind(q.ai_explanation.as_str())
            .execute(&mut *tx)
            .await
            .map_err(insert_err)?;

            sqlx::query(
                r"
                INSERT INTO progress (question_id, status, user_answer, is_marked)
                VALUES (?1, 0, '', 0)
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(insert_err)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(u64::try_from(questions.len()).unwrap_or(u64::MAX))
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, kind, content, options, answer, explanation, ai_explanation
            FROM questions WHERE id = ?1
            ",
        )
        .bind(question_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn update_question_fields(
        &self,
        id: QuestionId,
        correction: &QuestionCorrection,
    ) -> Result<(), StorageError> {
        let options = correction
            .options
            .as_deref()
            .map(encode_options)
            .transpose()?;

        let res = sqlx::query(
            r"
            UPDATE questions SET
                kind = COALESCE(?2, kind),
                options = COALESCE(?3, options),
                answer = COALESCE(?4, answer)
            WHERE id = ?1
            ",
        )
        .bind(question_id_to_i64(id)?)
        .bind(correction.kind.map(|k| k.as_str()))
        .bind(options)
        .bind(correction.answer.as_deref())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn set_ai_explanation(&self, id: QuestionId, text: &str) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE questions SET ai_explanation = ?2 WHERE id = ?1")
            .bind(question_id_to_i64(id)?)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
