use quiz_core::model::{
    MistakeEntry, ProgressRecord, ProgressStatus, Question, QuestionId, QuestionKind,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization("question_id sign overflow".into()))
}

pub(crate) fn count_from_i64(v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid count: {v}")))
}

/// Options are kept as a JSON array column; nothing outside this adapter sees the text.
pub(crate) fn encode_options(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn decode_options(raw: &str) -> Result<Vec<String>, StorageError> {
    // Older banks serialized a missing option list as `null`.
    let parsed: Option<Vec<String>> = serde_json::from_str(raw).map_err(ser)?;
    Ok(parsed.unwrap_or_default())
}

pub(crate) fn status_to_i64(status: ProgressStatus) -> i64 {
    i64::from(status.code())
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let kind_str: String = row.try_get("kind").map_err(ser)?;
    let options_raw: String = row.try_get("options").map_err(ser)?;

    Ok(Question {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        kind: QuestionKind::parse(&kind_str).map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        options: decode_options(&options_raw)?,
        answer: row.try_get("answer").map_err(ser)?,
        explanation: row.try_get("explanation").map_err(ser)?,
        ai_explanation: row.try_get("ai_explanation").map_err(ser)?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    Ok(ProgressRecord {
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        status: ProgressStatus::from_code(row.try_get::<i64, _>("status").map_err(ser)?)
            .map_err(ser)?,
        user_answer: row.try_get("user_answer").map_err(ser)?,
        is_marked: row.try_get::<i64, _>("is_marked").map_err(ser)? != 0,
    })
}

pub(crate) fn map_mistake_row(row: &SqliteRow) -> Result<MistakeEntry, StorageError> {
    let count_i64: i64 = row.try_get("count").map_err(ser)?;
    let count = u32::try_from(count_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid mistake count: {count_i64}")))?;
    Ok(MistakeEntry {
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_column_accepts_null() {
        assert!(decode_options("null").unwrap().is_empty());
        let opts = vec!["A. 正确".to_string(), "B. 错误".to_string()];
        let raw = encode_options(&opts).unwrap();
        assert_eq!(decode_options(&raw).unwrap(), opts);
    }

    #[test]
    fn rejects_negative_ids() {
        assert!(question_id_from_i64(-1).is_err());
        assert_eq!(question_id_from_i64(4).unwrap(), QuestionId::new(4));
    }
}
