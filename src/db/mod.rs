mod connection;
mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use models::{
    Group, GroupInput, MemberAdd, RankedScore, ScoreSnapshot, TaskPatch, TaskRecord, FOCUS_SESSION_TASK_NAME,
};
