use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr, time::Duration};
use thiserror::Error;

use crate::task::{self, TaskSort, ValidationErrors};

/// SQLite busy timeout — how long a writer waits on a locked database
/// before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct TaskRow {
    pub id: i64,
    pub title: String,
    /// Optional free text — NULL in the database when absent.
    pub description: Option<String>,
    pub is_done: bool,
    /// RFC 3339 UTC timestamp, set once at creation and never updated.
    pub created_at: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Title failed validation — nothing was written.
    #[error("validation failed")]
    Invalid(ValidationErrors),
    #[error("task {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (or create) the task database under `data_dir`.
    ///
    /// WAL journal + NORMAL synchronous: crash-safe without fsync on every
    /// write. The migration is idempotent and runs on every open.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| StoreError::Db(sqlx::Error::Io(e)))?;
        let db_path = data_dir.join("taskboard.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(BUSY_TIMEOUT)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
        // AUTOINCREMENT keeps deleted ids from being reused.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                description TEXT,
                is_done     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at)")
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Insert a new task and return the stored row.
    ///
    /// The title is validated first; on failure nothing is written and the
    /// field messages come back in `StoreError::Invalid`.
    pub async fn create_task(
        &self,
        title: &str,
        description: Option<&str>,
        is_done: bool,
    ) -> Result<TaskRow, StoreError> {
        task::validate_title(title).map_err(StoreError::Invalid)?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, is_done, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(description)
        .bind(is_done)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_task(id).await?.ok_or(StoreError::NotFound(id))
    }

    /// `None` is the not-found signal for read paths.
    pub async fn get_task(&self, id: i64) -> Result<Option<TaskRow>, StoreError> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Every task, ordered per the sort selector. Never filters.
    pub async fn list_tasks(&self, sort: TaskSort) -> Result<Vec<TaskRow>, StoreError> {
        // order_clause is a static fragment — no user input reaches the SQL.
        let query = format!("SELECT * FROM tasks ORDER BY {}", sort.order_clause());
        Ok(sqlx::query_as(&query).fetch_all(&self.pool).await?)
    }

    pub async fn count_tasks(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Overwrite the mutable fields of an existing task.
    ///
    /// Re-validates the title exactly as `create_task`; on failure the row
    /// is untouched. `created_at` and `id` are never written.
    pub async fn update_task(
        &self,
        id: i64,
        title: &str,
        description: Option<&str>,
        is_done: bool,
    ) -> Result<TaskRow, StoreError> {
        task::validate_title(title).map_err(StoreError::Invalid)?;

        let result =
            sqlx::query("UPDATE tasks SET title = ?, description = ?, is_done = ? WHERE id = ?")
                .bind(title)
                .bind(description)
                .bind(is_done)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.get_task(id).await?.ok_or(StoreError::NotFound(id))
    }

    /// Set the completion flag only. A bool has no invalid state, so there
    /// is nothing to validate.
    pub async fn set_done(&self, id: i64, value: bool) -> Result<TaskRow, StoreError> {
        let result = sqlx::query("UPDATE tasks SET is_done = ? WHERE id = ?")
            .bind(value)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.get_task(id).await?.ok_or(StoreError::NotFound(id))
    }

    /// Remove a task. Deleting a missing id is `NotFound`, not a fatal
    /// error — callers that want idempotence can ignore it.
    pub async fn delete_task(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_test_store() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let (_dir, storage) = open_test_store().await;
        let task = storage
            .create_task("Buy milk", Some("2 liters"), false)
            .await
            .unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description.as_deref(), Some("2 liters"));
        assert!(!task.is_done);
        assert!(!task.created_at.is_empty());
    }

    #[tokio::test]
    async fn invalid_title_writes_nothing() {
        let (_dir, storage) = open_test_store().await;
        for title in ["", " ", "a", &"x".repeat(256)] {
            let err = storage.create_task(title, None, false).await.unwrap_err();
            assert!(matches!(err, StoreError::Invalid(_)), "title {title:?}");
        }
        assert_eq!(storage.count_tasks().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_rejects_bad_title_and_keeps_row() {
        let (_dir, storage) = open_test_store().await;
        let task = storage.create_task("Keep this title", None, false).await.unwrap();

        let err = storage
            .update_task(task.id, "x", None, true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));

        let unchanged = storage.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "Keep this title");
        assert!(!unchanged.is_done);
    }

    #[tokio::test]
    async fn update_preserves_id_and_created_at() {
        let (_dir, storage) = open_test_store().await;
        let task = storage.create_task("Before", None, false).await.unwrap();
        let updated = storage
            .update_task(task.id, "After", Some("note"), true)
            .await
            .unwrap();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.title, "After");
        assert!(updated.is_done);
    }

    #[tokio::test]
    async fn set_done_is_an_involution() {
        let (_dir, storage) = open_test_store().await;
        let task = storage.create_task("Toggle me", None, false).await.unwrap();

        let flipped = storage.set_done(task.id, !task.is_done).await.unwrap();
        assert!(flipped.is_done);
        let restored = storage.set_done(task.id, !flipped.is_done).await.unwrap();
        assert_eq!(restored.is_done, task.is_done);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (_dir, storage) = open_test_store().await;
        let task = storage.create_task("Ephemeral", None, false).await.unwrap();
        storage.delete_task(task.id).await.unwrap();

        assert!(storage.get_task(task.id).await.unwrap().is_none());
        // Repeat delete is a NotFound error, never a panic or a DB fault.
        let err = storage.delete_task(task.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == task.id));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (_dir, storage) = open_test_store().await;
        assert!(storage.get_task(99).await.unwrap().is_none());
        assert!(matches!(
            storage.set_done(99, true).await.unwrap_err(),
            StoreError::NotFound(99)
        ));
        assert!(matches!(
            storage.update_task(99, "Valid title", None, false).await.unwrap_err(),
            StoreError::NotFound(99)
        ));
    }

    #[tokio::test]
    async fn ids_are_never_reused() {
        let (_dir, storage) = open_test_store().await;
        let first = storage.create_task("First", None, false).await.unwrap();
        storage.delete_task(first.id).await.unwrap();
        let second = storage.create_task("Second", None, false).await.unwrap();
        assert!(second.id > first.id);
    }
}
