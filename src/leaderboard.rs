use std::sync::Arc;

use anyhow::Result;
use log::warn;
use tokio::task::JoinHandle;

use crate::{
    db::{Group, RankedScore, ScoreSnapshot},
    store::LeaderboardStore,
};

/// Size of the global leaderboard listing.
pub const LEADERBOARD_LIMIT: usize = 20;

/// Writes each user's score document and reads rankings back.
///
/// Publishing is a blind overwrite keyed by user id: every user only writes
/// their own document, so there is nothing to reconcile and the call is safe
/// to repeat after every recomputation.
#[derive(Clone)]
pub struct LeaderboardPublisher {
    store: Arc<dyn LeaderboardStore>,
}

impl LeaderboardPublisher {
    pub fn new(store: Arc<dyn LeaderboardStore>) -> Self {
        Self { store }
    }

    pub async fn publish(
        &self,
        user_id: &str,
        display_name: &str,
        total_points: u64,
        today_minutes: u64,
    ) -> Result<()> {
        self.store
            .upsert_score(ScoreSnapshot {
                user_id: user_id.to_string(),
                display_name: display_name.to_string(),
                total_points,
                today_minutes,
            })
            .await
    }

    /// Fire-and-forget [`publish`](Self::publish). A failed write only leaves
    /// the remote copy stale, so it is logged and dropped.
    pub fn publish_detached(&self, score: ScoreSnapshot) -> JoinHandle<()> {
        let publisher = self.clone();
        tokio::spawn(async move {
            if let Err(err) = publisher
                .publish(
                    &score.user_id,
                    &score.display_name,
                    score.total_points,
                    score.today_minutes,
                )
                .await
            {
                warn!("score publish for {} failed: {err:?}", score.user_id);
            }
        })
    }

    pub async fn top(&self, limit: usize) -> Result<Vec<RankedScore>> {
        Ok(rank(self.store.top_scores(limit).await?))
    }

    /// Members of `group` that have published a score, best first.
    pub async fn group_standings(&self, group: &Group) -> Result<Vec<RankedScore>> {
        Ok(rank(self.store.scores_for(&group.members).await?))
    }
}

fn rank(scores: Vec<ScoreSnapshot>) -> Vec<RankedScore> {
    scores
        .into_iter()
        .zip(1u32..)
        .map(|(score, rank)| RankedScore { rank, score })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Utc;

    use super::*;
    use crate::{db::Database, testing::MemoryLeaderboard};

    #[tokio::test]
    async fn publish_overwrites_and_ranks() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let publisher = LeaderboardPublisher::new(db);

        publisher.publish("a", "Ana", 30, 10).await.unwrap();
        publisher.publish("b", "Ben", 20, 50).await.unwrap();
        publisher.publish("b", "Ben", 40, 55).await.unwrap();

        let top = publisher.top(LEADERBOARD_LIMIT).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[0].score.user_id, "b");
        assert_eq!(top[0].score.total_points, 40);
        assert_eq!(top[1].rank, 2);
    }

    #[tokio::test]
    async fn detached_failure_is_swallowed() {
        let store = Arc::new(MemoryLeaderboard::default());
        store.fail_writes.store(true, Ordering::SeqCst);
        let publisher = LeaderboardPublisher::new(store.clone());

        publisher
            .publish_detached(ScoreSnapshot {
                user_id: "a".into(),
                display_name: "Ana".into(),
                total_points: 10,
                today_minutes: 0,
            })
            .await
            .unwrap();
        assert!(store.score_of("a").is_none());
    }

    #[tokio::test]
    async fn group_standings_only_include_members() {
        let store = Arc::new(MemoryLeaderboard::default());
        let publisher = LeaderboardPublisher::new(store);
        publisher.publish("a", "Ana", 30, 0).await.unwrap();
        publisher.publish("b", "Ben", 50, 0).await.unwrap();
        publisher.publish("c", "Cy", 90, 0).await.unwrap();

        let group = Group {
            id: "g".into(),
            name: "Study".into(),
            description: String::new(),
            join_code: "ABCDEF".into(),
            daily_goal_minutes: 60,
            is_public: true,
            admin_id: "a".into(),
            members: vec!["a".into(), "b".into()],
            max_members: 20,
            created_at: Utc::now(),
        };

        let standings = publisher.group_standings(&group).await.unwrap();
        let users: Vec<_> = standings.iter().map(|r| r.score.user_id.as_str()).collect();
        assert_eq!(users, vec!["b", "a"]);
    }
}
