use serde::{Deserialize, Serialize};

/// Per-user totals republished after every stats recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub user_id: String,
    pub display_name: String,
    pub total_points: u64,
    pub today_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedScore {
    /// 1-based position in the listing it came from.
    pub rank: u32,
    pub score: ScoreSnapshot,
}
