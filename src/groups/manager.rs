use std::sync::Arc;

use anyhow::{bail, Result};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    clock::Clock,
    db::{Group, GroupInput, MemberAdd},
    settings::InputDefaults,
    store::GroupStore,
    utils::input::number_or,
};

use super::generate_join_code;

/// Page size for the public group listing.
pub const PUBLIC_GROUP_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
    NotFound,
}

#[derive(Clone)]
pub struct GroupManager {
    store: Arc<dyn GroupStore>,
    clock: Arc<dyn Clock>,
    user_id: String,
    defaults: InputDefaults,
}

impl GroupManager {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn GroupStore>,
        clock: Arc<dyn Clock>,
        defaults: InputDefaults,
    ) -> Self {
        Self {
            store,
            clock,
            user_id: user_id.into(),
            defaults,
        }
    }

    /// Creates a group administered by the caller, who is its only member.
    pub async fn create(&self, input: GroupInput) -> Result<Group> {
        let name = input.name.trim();
        if name.is_empty() {
            bail!("group name must not be empty");
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: input.description.trim().to_string(),
            join_code: generate_join_code(&mut rand::thread_rng()),
            daily_goal_minutes: number_or(&input.daily_goal_minutes, self.defaults.group_goal_minutes),
            is_public: input.is_public,
            admin_id: self.user_id.clone(),
            members: vec![self.user_id.clone()],
            max_members: number_or(&input.max_members, self.defaults.group_max_members),
            created_at: self.clock.now(),
        };

        let group = self.store.create_group(group).await?;
        info!("created group {} with code {}", group.id, group.join_code);
        Ok(group)
    }

    pub async fn join_by_code(&self, code: &str) -> Result<JoinOutcome> {
        match self.store.find_by_code(code).await? {
            Some(group) => self.add_self(&group.id).await,
            None => Ok(JoinOutcome::NotFound),
        }
    }

    /// Joins `group` by id. The outcome reflects the stored member list, not
    /// the copy passed in, which may be stale.
    pub async fn join(&self, group: &Group) -> Result<JoinOutcome> {
        self.add_self(&group.id).await
    }

    async fn add_self(&self, group_id: &str) -> Result<JoinOutcome> {
        match self.store.add_member(group_id, &self.user_id).await? {
            Some(MemberAdd::Added(_)) => {
                info!("{} joined group {group_id}", self.user_id);
                Ok(JoinOutcome::Joined)
            }
            Some(MemberAdd::AlreadyPresent(_)) => Ok(JoinOutcome::AlreadyMember),
            None => Ok(JoinOutcome::NotFound),
        }
    }

    pub async fn my_groups(&self) -> Result<Vec<Group>> {
        self.store.groups_for_member(&self.user_id).await
    }

    pub async fn public_groups(&self) -> Result<Vec<Group>> {
        self.store.public_groups(PUBLIC_GROUP_LIMIT).await
    }

    /// Case-insensitive name filter over the public listing.
    pub async fn search_public(&self, query: &str) -> Result<Vec<Group>> {
        let needle = query.trim().to_lowercase();
        let groups = self.public_groups().await?;
        if needle.is_empty() {
            return Ok(groups);
        }
        Ok(groups
            .into_iter()
            .filter(|group| group.name.to_lowercase().contains(&needle))
            .collect())
    }
}
