use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Row};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    db::{
        connection::Database,
        helpers::{count_or_zero, text_or_empty},
        models::{TaskPatch, TaskRecord},
    },
    store::{TaskStore, TaskSubscription},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const SUBSCRIPTION_BUFFER: usize = 16;

fn row_to_task(row: &Row) -> Result<TaskRecord> {
    let duration_minutes: Option<i64> = row.get("duration_minutes")?;
    let is_completed: Option<i64> = row.get("is_completed")?;

    Ok(TaskRecord {
        id: row.get("id")?,
        name: text_or_empty(row.get("name")?),
        duration_minutes: count_or_zero(duration_minutes),
        is_completed: is_completed.unwrap_or(0) != 0,
        date: row.get("date")?,
        owner_id: row.get("owner_id")?,
    })
}

impl Database {
    pub async fn insert_task(&self, record: TaskRecord) -> Result<TaskRecord> {
        let mut record = record;
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }

        let stored = self
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO tasks (id, owner_id, name, duration_minutes, is_completed, date, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        record.id,
                        record.owner_id,
                        record.name,
                        i64::from(record.duration_minutes),
                        record.is_completed,
                        record.date,
                        Utc::now().to_rfc3339(),
                    ],
                )
                .with_context(|| "failed to insert task")?;
                Ok(record)
            })
            .await?;

        self.notify_tasks_changed();
        Ok(stored)
    }

    pub async fn list_tasks_for_owner(&self, owner_id: &str) -> Result<Vec<TaskRecord>> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name, duration_minutes, is_completed, date
                 FROM tasks
                 WHERE owner_id = ?1
                 ORDER BY date DESC, id ASC",
            )?;

            let mut rows = stmt.query(params![owner_id])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }
            Ok(tasks)
        })
        .await
    }

    pub async fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<()> {
        let task_id = task_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE tasks
                 SET is_completed = ?1,
                     updated_at = ?2
                 WHERE id = ?3",
                params![completed, Utc::now().to_rfc3339(), task_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("task {task_id} not found"));
            }
            Ok(())
        })
        .await?;

        self.notify_tasks_changed();
        Ok(())
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn subscribe(&self, owner_id: &str) -> Result<TaskSubscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut revisions = self.watch_tasks();
        revisions.borrow_and_update();

        let initial = self.list_tasks_for_owner(owner_id).await?;
        tx.send(initial)
            .await
            .map_err(|_| anyhow!("subscriber dropped before first snapshot"))?;

        let db = self.clone();
        let owner_id = owner_id.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        revisions.borrow_and_update();
                        match db.list_tasks_for_owner(&owner_id).await {
                            Ok(snapshot) => {
                                if tx.send(snapshot).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => log_error!("task snapshot for {owner_id} failed: {err:?}"),
                        }
                    }
                    _ = tx.closed() => break,
                }
            }
            log_info!("task subscription for {owner_id} closed");
        });

        Ok(rx)
    }

    async fn create_task(&self, record: TaskRecord) -> Result<TaskRecord> {
        self.insert_task(record).await
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<()> {
        if patch.is_empty() {
            bail!("empty patch for task {id}");
        }
        if let Some(completed) = patch.is_completed {
            self.set_task_completed(id, completed).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;

    fn record(owner: &str, name: &str, date_ms: i64) -> TaskRecord {
        let created = Utc.timestamp_millis_opt(date_ms).unwrap();
        TaskRecord::new(owner, name, 25, created)
    }

    #[tokio::test]
    async fn create_assigns_id_and_lists_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let older = db.create_task(record("u1", "read", 1_000)).await.unwrap();
        let newer = db.create_task(record("u1", "write", 2_000)).await.unwrap();
        db.create_task(record("u2", "other", 3_000)).await.unwrap();

        assert!(!older.id.is_empty());
        assert_ne!(older.id, newer.id);

        let tasks = db.list_tasks_for_owner("u1").await.unwrap();
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["write", "read"]);
    }

    #[tokio::test]
    async fn update_flips_completion_only() {
        let db = Database::open_in_memory().unwrap();
        let task = db.create_task(record("u1", "read", 1_000)).await.unwrap();

        db.update_task(&task.id, TaskPatch::completed(true)).await.unwrap();

        let stored = db.list_tasks_for_owner("u1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_completed);
        assert_eq!(stored[0].date, 1_000);
        assert_eq!(stored[0].duration_minutes, 25);
    }

    #[tokio::test]
    async fn update_of_unknown_task_fails() {
        let db = Database::open_in_memory().unwrap();
        assert!(db
            .update_task("missing", TaskPatch::completed(true))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let task = db.create_task(record("u1", "read", 1_000)).await.unwrap();

        assert!(db.update_task(&task.id, TaskPatch::default()).await.is_err());
        assert!(!db.list_tasks_for_owner("u1").await.unwrap()[0].is_completed);
    }

    #[tokio::test]
    async fn malformed_rows_are_defaulted() {
        let db = Database::open_in_memory().unwrap();
        db.execute(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, owner_id, name, duration_minutes, is_completed, date, updated_at)
                 VALUES ('raw', 'u1', NULL, -20, 1, 5, 'now')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let tasks = db.list_tasks_for_owner("u1").await.unwrap();
        assert_eq!(tasks[0].name, "");
        assert_eq!(tasks[0].duration_minutes, 0);
        assert!(tasks[0].is_completed);
    }

    #[tokio::test]
    async fn subscription_pushes_full_snapshots() {
        let db = Database::open_in_memory().unwrap();
        db.create_task(record("u1", "first", 1_000)).await.unwrap();

        let mut feed = db.subscribe("u1").await.unwrap();
        let initial = feed.recv().await.unwrap();
        assert_eq!(initial.len(), 1);

        db.create_task(record("u1", "second", 2_000)).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(5), feed.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.len(), 2);
        assert!(next.iter().all(|t| t.owner_id == "u1"));
    }

    #[tokio::test]
    async fn dropping_the_feed_ends_the_pump() {
        let db = Database::open_in_memory().unwrap();
        let mut feed = db.subscribe("u1").await.unwrap();
        feed.recv().await.unwrap();
        assert_eq!(db.task_watchers(), 1);

        drop(feed);
        tokio::time::timeout(Duration::from_secs(5), async {
            while db.task_watchers() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let saved = tokio::time::timeout(
            Duration::from_secs(5),
            db.create_task(record("u1", "later", 2_000)),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(db.list_tasks_for_owner("u1").await.unwrap()[0].id, saved.id);
    }
}
