//! The editing session (UI-agnostic).

mod ops;
mod search;
mod state;

pub use search::SearchState;
pub use state::{Change, EditState, Session, Snapshot};
