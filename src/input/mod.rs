//! Input-side helpers: tab completion and persisted line history.

pub mod completion;
pub mod history;
