//! Remote accessor module.
//!
//! This module provides the `ListSource` and `DetailSource` traits the
//! synchronization layer depends on, and `ApiClient`, their HTTP
//! implementation against the remote store's REST interface.

pub mod accessor;
pub mod client;
pub mod error;

pub use accessor::{DetailSource, ListSource};
pub use client::ApiClient;
pub use error::ApiError;
