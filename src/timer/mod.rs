pub mod controller;
pub mod state;

pub use controller::{FocusController, StopOutcome};
pub use state::{recorded_minutes, FocusState, FocusStatus, MIN_RECORDED_SECS};
