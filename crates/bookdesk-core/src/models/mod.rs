//! Data models for the remote store.
//!
//! - `Record`, `StatusRecord`, `Table`: traits every projected row implements
//! - `Filter`: status filter plus the reserved no-status value
//! - `BookingRequest`, `BookingStatus`: the booking review queue
//! - `GalleryItem`: media gallery detail records

pub mod booking;
pub mod gallery;
pub mod record;

pub use booking::{BookingRequest, BookingStatus};
pub use gallery::GalleryItem;
pub use record::{Filter, Record, StatusRecord, Table};
