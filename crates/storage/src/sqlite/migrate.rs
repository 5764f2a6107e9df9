use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// One schema version: statements applied together in a transaction.
struct Migration {
    version: i64,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[
        r"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            content TEXT NOT NULL,
            options TEXT NOT NULL,
            answer TEXT NOT NULL,
            explanation TEXT NOT NULL DEFAULT '',
            ai_explanation TEXT NOT NULL DEFAULT ''
        )
        ",
        r"
        CREATE TABLE IF NOT EXISTS progress (
            question_id INTEGER PRIMARY KEY,
            status INTEGER NOT NULL DEFAULT 0 CHECK (status BETWEEN 0 AND 2),
            user_answer TEXT NOT NULL DEFAULT '',
            is_marked INTEGER NOT NULL DEFAULT 0 CHECK (is_marked IN (0, 1)),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        )
        ",
        r"
        CREATE TABLE IF NOT EXISTS mistakes (
            question_id INTEGER PRIMARY KEY,
            count INTEGER NOT NULL CHECK (count >= 1),
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        )
        ",
        "CREATE INDEX IF NOT EXISTS idx_progress_status ON progress(status)",
    ],
}];

/// Highest version this build knows how to apply.
pub const LATEST_VERSION: i64 = 1;

/// Apply every migration not yet recorded in `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    let applied = current_version(pool).await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        let mut tx = pool.begin().await?;
        for statement in migration.statements {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(migration.version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        info!(version = migration.version, "applied schema migration");
    }

    Ok(())
}

/// Latest applied version, `0` on a fresh database.
pub async fn current_version(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}
