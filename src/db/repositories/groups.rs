use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{count_or_zero, decode_members, encode_members, parse_datetime, text_or_empty},
        models::{Group, MemberAdd},
    },
    store::GroupStore,
};

const GROUP_COLUMNS: &str = "id, name, description, join_code, daily_goal_minutes, is_public,
     admin_id, members, max_members, created_at";

fn row_to_group(row: &Row) -> Result<Group> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let is_public: Option<i64> = row.get("is_public")?;
    let members = decode_members(row.get("members")?, &id);

    Ok(Group {
        name: row.get("name")?,
        description: text_or_empty(row.get("description")?),
        join_code: row.get("join_code")?,
        daily_goal_minutes: count_or_zero(row.get("daily_goal_minutes")?),
        is_public: is_public.unwrap_or(0) != 0,
        admin_id: row.get("admin_id")?,
        members,
        max_members: count_or_zero(row.get("max_members")?),
        created_at: parse_datetime(&created_at, "created_at")?,
        id,
    })
}

fn load_group(conn: &Connection, group_id: &str) -> Result<Option<Group>> {
    let sql = format!("SELECT {GROUP_COLUMNS} FROM study_groups WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![group_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_group(row)?)),
        None => Ok(None),
    }
}

fn collect_groups(conn: &Connection, sql: &str, params: impl Params) -> Result<Vec<Group>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut groups = Vec::new();
    while let Some(row) = rows.next()? {
        groups.push(row_to_group(row)?);
    }
    Ok(groups)
}

impl Database {
    pub async fn insert_group(&self, group: Group) -> Result<Group> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO study_groups (id, name, description, join_code, daily_goal_minutes, is_public,
                                     admin_id, members, max_members, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    group.id,
                    group.name,
                    group.description,
                    group.join_code,
                    i64::from(group.daily_goal_minutes),
                    group.is_public,
                    group.admin_id,
                    encode_members(&group.members)?,
                    i64::from(group.max_members),
                    group.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to insert group {}", group.id))?;
            Ok(group)
        })
        .await
    }

    pub async fn get_group_by_code(&self, code: &str) -> Result<Option<Group>> {
        let code = code.to_string();
        self.execute(move |conn| {
            // Codes are not guaranteed unique; the oldest group owns a shared code.
            let sql = format!(
                "SELECT {GROUP_COLUMNS} FROM study_groups
                 WHERE join_code = ?1
                 ORDER BY created_at ASC, id ASC
                 LIMIT 1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let group = stmt
                .query_row(params![code], |row| Ok(row_to_group(row)))
                .optional()?
                .transpose()?;
            Ok(group)
        })
        .await
    }

    pub async fn list_public_groups(&self, limit: usize) -> Result<Vec<Group>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {GROUP_COLUMNS} FROM study_groups
                 WHERE is_public = 1
                 ORDER BY created_at DESC, id ASC
                 LIMIT ?1"
            );
            collect_groups(conn, &sql, params![limit])
        })
        .await
    }

    pub async fn list_groups_for_member(&self, user_id: &str) -> Result<Vec<Group>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let sql = format!(
                "SELECT {GROUP_COLUMNS} FROM study_groups
                 WHERE EXISTS (
                     SELECT 1 FROM json_each(
                         CASE WHEN json_valid(study_groups.members) THEN study_groups.members ELSE '[]' END
                     )
                     WHERE value = ?1
                 )
                 ORDER BY created_at DESC, id ASC"
            );
            collect_groups(conn, &sql, params![user_id])
        })
        .await
    }

    pub async fn add_group_member(&self, group_id: &str, user_id: &str) -> Result<Option<MemberAdd>> {
        let group_id = group_id.to_string();
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let Some(mut group) = load_group(conn, &group_id)? else {
                return Ok(None);
            };
            if group.is_member(&user_id) {
                return Ok(Some(MemberAdd::AlreadyPresent(group)));
            }

            group.members.push(user_id);
            conn.execute(
                "UPDATE study_groups SET members = ?1 WHERE id = ?2",
                params![encode_members(&group.members)?, group_id],
            )
            .with_context(|| format!("failed to update members of group {group_id}"))?;
            Ok(Some(MemberAdd::Added(group)))
        })
        .await
    }
}

#[async_trait]
impl GroupStore for Database {
    async fn create_group(&self, group: Group) -> Result<Group> {
        self.insert_group(group).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Group>> {
        self.get_group_by_code(code).await
    }

    async fn public_groups(&self, limit: usize) -> Result<Vec<Group>> {
        self.list_public_groups(limit).await
    }

    async fn groups_for_member(&self, user_id: &str) -> Result<Vec<Group>> {
        self.list_groups_for_member(user_id).await
    }

    async fn add_member(&self, group_id: &str, user_id: &str) -> Result<Option<MemberAdd>> {
        self.add_group_member(group_id, user_id).await
    }
}
