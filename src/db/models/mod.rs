pub mod group;
pub mod score;
pub mod task;

pub use group::{Group, GroupInput, MemberAdd};
pub use score::{RankedScore, ScoreSnapshot};
pub use task::{TaskPatch, TaskRecord, FOCUS_SESSION_TASK_NAME};
