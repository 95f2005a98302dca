//! Group documents and the input used to create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub join_code: String,
    pub daily_goal_minutes: u32,
    pub is_public: bool,
    pub admin_id: String,
    /// User ids in join order, no duplicates.
    pub members: Vec<String>,
    pub max_members: u32,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|member| member == user_id)
    }
}

/// Result of adding a user to a group's member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberAdd {
    /// The user was appended; carries the updated group.
    Added(Group),
    /// The user was already listed; nothing was written.
    AlreadyPresent(Group),
}

/// Raw values from the create-group form. Numeric fields are kept as typed
/// text and parsed with fallbacks when the group is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInput {
    pub name: String,
    pub description: String,
    pub daily_goal_minutes: String,
    pub is_public: bool,
    pub max_members: String,
}
