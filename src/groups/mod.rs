pub mod code;
pub mod manager;

pub use code::{generate_join_code, JOIN_CODE_LEN};
pub use manager::{GroupManager, JoinOutcome, PUBLIC_GROUP_LIMIT};
