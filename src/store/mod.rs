pub mod state;
pub mod status;
pub mod store;

pub use state::{SelectionSnapshot, SelectionState};
pub use status::{FetchStatus, StatusBoard, StatusWatcher};
pub use store::{SelectionStore, StateWatcher};
