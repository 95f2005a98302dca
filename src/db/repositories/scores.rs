use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{encode_members, text_or_empty, to_i64, total_or_zero},
        models::ScoreSnapshot,
    },
    store::LeaderboardStore,
};

fn row_to_score(row: &Row) -> Result<ScoreSnapshot> {
    Ok(ScoreSnapshot {
        user_id: row.get("user_id")?,
        display_name: text_or_empty(row.get("display_name")?),
        total_points: total_or_zero(row.get("total_points")?),
        today_minutes: total_or_zero(row.get("today_minutes")?),
    })
}

impl Database {
    pub async fn upsert_score_row(&self, score: ScoreSnapshot) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO scores (user_id, display_name, total_points, today_minutes, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     display_name = excluded.display_name,
                     total_points = excluded.total_points,
                     today_minutes = excluded.today_minutes,
                     updated_at = excluded.updated_at",
                params![
                    score.user_id,
                    score.display_name,
                    to_i64(score.total_points)?,
                    to_i64(score.today_minutes)?,
                    Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to upsert score for {}", score.user_id))?;
            Ok(())
        })
        .await
    }

    pub async fn list_top_scores(&self, limit: usize) -> Result<Vec<ScoreSnapshot>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, display_name, total_points, today_minutes
                 FROM scores
                 ORDER BY total_points DESC, today_minutes DESC, user_id ASC
                 LIMIT ?1",
            )?;
            let mut rows = stmt.query(params![limit])?;
            let mut scores = Vec::new();
            while let Some(row) = rows.next()? {
                scores.push(row_to_score(row)?);
            }
            Ok(scores)
        })
        .await
    }

    pub async fn list_scores_for(&self, user_ids: &[String]) -> Result<Vec<ScoreSnapshot>> {
        let ids = encode_members(user_ids)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, display_name, total_points, today_minutes
                 FROM scores
                 WHERE user_id IN (SELECT value FROM json_each(?1))
                 ORDER BY total_points DESC, today_minutes DESC, user_id ASC",
            )?;
            let mut rows = stmt.query(params![ids])?;
            let mut scores = Vec::new();
            while let Some(row) = rows.next()? {
                scores.push(row_to_score(row)?);
            }
            Ok(scores)
        })
        .await
    }
}

#[async_trait]
impl LeaderboardStore for Database {
    async fn upsert_score(&self, score: ScoreSnapshot) -> Result<()> {
        self.upsert_score_row(score).await
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<ScoreSnapshot>> {
        self.list_top_scores(limit).await
    }

    async fn scores_for(&self, user_ids: &[String]) -> Result<Vec<ScoreSnapshot>> {
        self.list_scores_for(user_ids).await
    }
}
