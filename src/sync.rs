//! Local view of the signed-in user's tasks, kept in step with the task store.
//!
//! Every store snapshot replaces the local task list wholesale and the stats
//! are recomputed from scratch, then the score document is republished. Local
//! edits (completion toggles) are applied optimistically and compensated if
//! the store rejects them.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Local;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    db::{ScoreSnapshot, TaskPatch, TaskRecord},
    leaderboard::LeaderboardPublisher,
    settings::UserProfile,
    stats::{activity_heatmap, badge_progress, compute_derived, BadgeProgress, DerivedStats, HeatmapCell},
    store::TaskStore,
    utils::input::number_or,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// Every task the owner has, as last seen or locally edited.
    pub tasks: Vec<TaskRecord>,
    pub stats: DerivedStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleOutcome {
    Confirmed,
    Reverted,
}

struct SyncInner {
    profile: UserProfile,
    tasks: Arc<dyn TaskStore>,
    publisher: LeaderboardPublisher,
    clock: Arc<dyn Clock>,
    default_task_minutes: u32,
    view: watch::Sender<TaskView>,
}

#[derive(Clone)]
pub struct TaskSync {
    inner: Arc<SyncInner>,
}

impl TaskSync {
    pub fn new(
        profile: UserProfile,
        tasks: Arc<dyn TaskStore>,
        publisher: LeaderboardPublisher,
        clock: Arc<dyn Clock>,
        default_task_minutes: u32,
    ) -> Self {
        let (view, _) = watch::channel(TaskView::default());
        Self {
            inner: Arc::new(SyncInner {
                profile,
                tasks,
                publisher,
                clock,
                default_task_minutes,
                view,
            }),
        }
    }

    pub fn view(&self) -> TaskView {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskView> {
        self.inner.view.subscribe()
    }

    /// Consumes the owner's live task feed until `cancel` fires or the store
    /// closes the feed.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let owner_id = self.inner.profile.user_id.clone();
        let mut feed = self.inner.tasks.subscribe(&owner_id).await?;
        log_info!("task sync started for {owner_id}");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                snapshot = feed.recv() => match snapshot {
                    Some(tasks) => {
                        self.apply_snapshot(tasks);
                    }
                    None => {
                        log_warn!("task feed for {owner_id} closed by the store");
                        break;
                    }
                },
            }
        }

        log_info!("task sync stopped for {owner_id}");
        Ok(())
    }

    /// Replaces local state with `tasks` and republishes the score.
    pub fn apply_snapshot(&self, tasks: Vec<TaskRecord>) -> DerivedStats {
        let now = self.inner.clock.now();
        let stats = compute_derived(&tasks, now);
        log_debug!(
            "snapshot of {} tasks: {} points, {} minutes today, streak {}",
            tasks.len(),
            stats.total_points,
            stats.today_minutes,
            stats.streak
        );

        self.inner.view.send_replace(TaskView {
            tasks,
            stats: stats.clone(),
        });
        self.publish(&stats);
        stats
    }

    /// Creates a task from form input. Blank names are ignored; minutes that
    /// don't parse fall back to the configured default. The local view is not
    /// touched; the new task arrives with the next store snapshot.
    pub async fn add_task(&self, name: &str, minutes_input: &str) -> Result<Option<TaskRecord>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let record = TaskRecord::new(
            self.inner.profile.user_id.clone(),
            name,
            number_or(minutes_input, self.inner.default_task_minutes),
            self.inner.clock.now(),
        );

        match self.inner.tasks.create_task(record).await {
            Ok(saved) => Ok(Some(saved)),
            Err(err) => {
                log_warn!("failed to create task '{name}': {err:?}");
                Err(err)
            }
        }
    }

    /// Flips completion locally right away and writes it in the background.
    /// If the write fails the local value goes back to what it was, unless
    /// something else has changed it in the meantime.
    pub fn toggle_completed(&self, task_id: &str) -> Result<JoinHandle<ToggleOutcome>> {
        let Some(completed) = self.set_local_completion(task_id, None) else {
            bail!("unknown task {task_id}");
        };

        let sync = self.clone();
        let task_id = task_id.to_string();
        Ok(tokio::spawn(async move {
            let patch = TaskPatch::completed(completed);
            match sync.inner.tasks.update_task(&task_id, patch).await {
                Ok(()) => ToggleOutcome::Confirmed,
                Err(err) => {
                    log_warn!("toggle of {task_id} rejected, reverting: {err:?}");
                    sync.set_local_completion(&task_id, Some(completed));
                    ToggleOutcome::Reverted
                }
            }
        }))
    }

    /// With `expected: None`, flips the task. With `Some(v)`, flips it back
    /// only if it still reads `v`. Returns the new value when a change was
    /// made.
    fn set_local_completion(&self, task_id: &str, expected: Option<bool>) -> Option<bool> {
        let now = self.inner.clock.now();
        let mut changed_to = None;

        self.inner.view.send_if_modified(|view| {
            let Some(task) = view.tasks.iter_mut().find(|task| task.id == task_id) else {
                return false;
            };
            if expected.is_some_and(|value| task.is_completed != value) {
                return false;
            }
            task.is_completed = !task.is_completed;
            changed_to = Some(task.is_completed);
            view.stats = compute_derived(&view.tasks, now);
            true
        });

        if changed_to.is_some() {
            let stats = self.inner.view.borrow().stats.clone();
            self.publish(&stats);
        }
        changed_to
    }

    fn publish(&self, stats: &DerivedStats) {
        let profile = &self.inner.profile;
        self.inner.publisher.publish_detached(ScoreSnapshot {
            user_id: profile.user_id.clone(),
            display_name: profile.display_name.clone(),
            total_points: stats.total_points,
            today_minutes: stats.today_minutes,
        });
    }

    /// Daily minutes for the last `days` days, for the consistency map.
    pub fn heatmap(&self, days: u32) -> Vec<HeatmapCell> {
        let today = self.inner.clock.now().with_timezone(&Local).date_naive();
        activity_heatmap(&self.inner.view.borrow().tasks, today, days, &Local)
    }

    pub fn badges(&self) -> Vec<BadgeProgress> {
        badge_progress(self.inner.view.borrow().stats.total_points)
    }
}
