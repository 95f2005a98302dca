//! In-memory store doubles shared by the unit tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    db::{ScoreSnapshot, TaskPatch, TaskRecord},
    store::{LeaderboardStore, TaskStore, TaskSubscription},
};

#[derive(Default)]
pub struct MemoryTaskStore {
    pub tasks: Mutex<Vec<TaskRecord>>,
    pub updates: Mutex<Vec<(String, TaskPatch)>>,
    pub fail_writes: AtomicBool,
    feeds: Mutex<Vec<mpsc::Sender<Vec<TaskRecord>>>>,
}

impl MemoryTaskStore {
    pub fn with_tasks(tasks: Vec<TaskRecord>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<TaskRecord> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn check_online(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("store unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn subscribe(&self, owner_id: &str) -> Result<TaskSubscription> {
        let (tx, rx) = mpsc::channel(4);
        let owned = self
            .snapshot()
            .into_iter()
            .filter(|task| task.owner_id == owner_id)
            .collect();
        tx.send(owned).await.map_err(|_| anyhow!("receiver dropped"))?;
        // Held so the feed stays open for the life of the store.
        self.feeds.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
        Ok(rx)
    }

    async fn create_task(&self, mut record: TaskRecord) -> Result<TaskRecord> {
        self.check_online()?;
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        record.id = format!("task-{}", tasks.len() + 1);
        tasks.push(record.clone());
        Ok(record)
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<()> {
        self.check_online()?;
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id.to_string(), patch.clone()));
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("task {id} not found"))?;
        if let Some(completed) = patch.is_completed {
            task.is_completed = completed;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLeaderboard {
    pub scores: Mutex<Vec<ScoreSnapshot>>,
    pub fail_writes: AtomicBool,
}

impl MemoryLeaderboard {
    pub fn score_of(&self, user_id: &str) -> Option<ScoreSnapshot> {
        self.scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|score| score.user_id == user_id)
            .cloned()
    }
}

#[async_trait]
impl LeaderboardStore for MemoryLeaderboard {
    async fn upsert_score(&self, score: ScoreSnapshot) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("leaderboard unreachable");
        }
        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        scores.retain(|existing| existing.user_id != score.user_id);
        scores.push(score);
        Ok(())
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<ScoreSnapshot>> {
        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner).clone();
        scores.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        scores.truncate(limit);
        Ok(scores)
    }

    async fn scores_for(&self, user_ids: &[String]) -> Result<Vec<ScoreSnapshot>> {
        let mut scores: Vec<_> = self
            .scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|score| user_ids.contains(&score.user_id))
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        Ok(scores)
    }
}
