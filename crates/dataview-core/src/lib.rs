//! dataview-core - UI-agnostic dataset model, editing session and storage.

pub mod dataset;
pub mod error;
pub mod layout;
pub mod session;
pub mod storage;
pub mod value;
pub mod variable;

pub use dataset::{CellRef, Dataset, Row};
pub use error::{DataviewError, Result};
pub use layout::{ColumnLayout, MIN_COLUMN_WIDTH};
pub use session::{Change, EditState, SearchState, Session, Snapshot};
pub use value::Value;
pub use variable::{Alignment, Measure, Role, VarType, Variable};
