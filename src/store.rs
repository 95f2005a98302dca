//! Collaborator contracts for the remote collections.
//!
//! The sync layer, focus controller, leaderboard and group manager only ever
//! talk to these traits. [`crate::db::Database`] implements all three on top of
//! SQLite; tests substitute their own implementations to inject failures.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::db::{Group, MemberAdd, ScoreSnapshot, TaskPatch, TaskRecord};

/// Live feed of an owner's complete task set. Each message replaces the
/// previous one entirely. Dropping the receiver ends the subscription.
pub type TaskSubscription = mpsc::Receiver<Vec<TaskRecord>>;

#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    /// Yields the current snapshot immediately, then one per change.
    async fn subscribe(&self, owner_id: &str) -> Result<TaskSubscription>;

    /// Persists `record` and returns it with its assigned id.
    async fn create_task(&self, record: TaskRecord) -> Result<TaskRecord>;

    async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<()>;
}

#[async_trait]
pub trait LeaderboardStore: Send + Sync + 'static {
    /// Full overwrite of the document keyed by `score.user_id`.
    async fn upsert_score(&self, score: ScoreSnapshot) -> Result<()>;

    /// Highest `total_points` first.
    async fn top_scores(&self, limit: usize) -> Result<Vec<ScoreSnapshot>>;

    async fn scores_for(&self, user_ids: &[String]) -> Result<Vec<ScoreSnapshot>>;
}

#[async_trait]
pub trait GroupStore: Send + Sync + 'static {
    async fn create_group(&self, group: Group) -> Result<Group>;

    /// Exact match on the join code.
    async fn find_by_code(&self, code: &str) -> Result<Option<Group>>;

    async fn public_groups(&self, limit: usize) -> Result<Vec<Group>>;

    async fn groups_for_member(&self, user_id: &str) -> Result<Vec<Group>>;

    /// Set-union of `user_id` into the group's members, reporting whether
    /// the list changed. `None` if the group does not exist.
    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<Option<MemberAdd>>;
}
