//! Client-side projection of status-filtered remote lists.
//!
//! - `ListSynchronizer`: owns the collection, `loading` and `error`
//! - `SelectionController`: the user's selection within that collection

pub mod list;
pub mod selection;

pub use list::{ListSynchronizer, Outcome, SyncSnapshot};
pub use selection::SelectionController;
