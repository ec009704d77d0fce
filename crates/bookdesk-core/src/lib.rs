//! Core library for bookdesk.
//!
//! Keeps in-memory, UI-visible collections consistent with a remote
//! relational store:
//!
//! - `api`: the remote accessor traits and their HTTP implementation
//! - `sync`: the list synchronizer and its selection state
//! - `cache`: the keyed detail-record cache
//! - `gate`: the confirmation gate for destructive commands
//! - `models`: booking requests, gallery items and the record traits
//! - `config`: file and environment configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod gate;
pub mod models;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, DetailSource, ListSource};
pub use cache::KeyedCache;
pub use config::Config;
pub use gate::{Confirmation, ConfirmationGate, GateAction, Prompt};
pub use models::{BookingRequest, BookingStatus, Filter, GalleryItem, Record, StatusRecord};
pub use sync::{ListSynchronizer, Outcome, SelectionController, SyncSnapshot};
