//! The remote accessor seam.
//!
//! The synchronizer and the keyed cache only ever talk to the remote store
//! through these traits. Implementations may fail asynchronously and must
//! not retry or cache on their own.

use async_trait::async_trait;

use crate::models::{Record, StatusRecord};

use super::ApiError;

/// Status-filtered reads and status transitions for one record type.
#[async_trait]
pub trait ListSource<R: StatusRecord>: Send + Sync {
    /// Fetch every record currently in `status`.
    async fn fetch_by_filter(&self, status: R::Status) -> Result<Vec<R>, ApiError>;

    /// Move one record to `status`.
    async fn update_status(&self, id: &R::Id, status: R::Status) -> Result<(), ApiError>;

    /// Move every record in `ids` to `status` in a single remote call.
    async fn update_status_many(&self, ids: &[R::Id], status: R::Status) -> Result<(), ApiError>;
}

/// Single-record reads of fully hydrated detail records.
#[async_trait]
pub trait DetailSource<R: Record>: Send + Sync {
    /// Fetch one record. A missing row is `ApiError::NotFound`.
    async fn fetch_by_id(&self, id: &R::Id) -> Result<R, ApiError>;
}
