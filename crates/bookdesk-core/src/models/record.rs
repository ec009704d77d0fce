//! Traits shared by every remote row the client projects.

use std::fmt;
use std::hash::Hash;

use serde::Serialize;

/// A remote row as seen by the client: an immutable snapshot with a stable id.
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

/// A record that carries a lifecycle status from a small closed set.
pub trait StatusRecord: Record {
    type Status: Copy + Eq + fmt::Debug + fmt::Display + Serialize + Send + Sync + 'static;

    fn status(&self) -> Self::Status;
}

/// Where a record lives in the remote store.
pub trait Table {
    /// Remote table name.
    const TABLE: &'static str;

    /// Ordering applied to list queries (`column.direction`).
    const ORDER: &'static str = "created_at.desc";

    /// Columns selected by list queries. Detail fetches select every column.
    const SUMMARY_COLUMNS: &'static str = "*";
}

/// The value selecting which records populate a collection.
///
/// `NoStatus` is never persisted. It models views with no status-queryable
/// store behind them (an availability calendar, for instance) and always
/// yields an empty collection without touching the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter<S> {
    Status(S),
    NoStatus,
}

impl<S: Copy> Filter<S> {
    pub fn status(&self) -> Option<S> {
        match self {
            Filter::Status(status) => Some(*status),
            Filter::NoStatus => None,
        }
    }
}

impl<S: fmt::Display> fmt::Display for Filter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Status(status) => write!(f, "{}", status),
            Filter::NoStatus => write!(f, "(none)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_status() {
        assert_eq!(Filter::Status(3).status(), Some(3));
        assert_eq!(Filter::<i32>::NoStatus.status(), None);
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(Filter::Status("pending").to_string(), "pending");
        assert_eq!(Filter::<&str>::NoStatus.to_string(), "(none)");
    }
}
