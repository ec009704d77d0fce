use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Record, StatusRecord, Table};

/// Review state of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Declined,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Declined,
    ];

    /// Wire value used in query strings and request bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Declined => "declined",
        }
    }

    /// Verb shown on the confirmation prompt.
    pub fn action_label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Move back to pending",
            BookingStatus::Approved => "Approve",
            BookingStatus::Declined => "Decline",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub guest_count: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingRequest {
    pub fn formatted_event_date(&self) -> String {
        match self.event_date {
            Some(date) => date.format("%b %d, %Y").to_string(),
            None => "TBD".to_string(),
        }
    }
}

impl Record for BookingRequest {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

impl StatusRecord for BookingRequest {
    type Status = BookingStatus;

    fn status(&self) -> BookingStatus {
        self.status
    }
}

impl Table for BookingRequest {
    const TABLE: &'static str = "booking_requests";
    const SUMMARY_COLUMNS: &'static str = "id,name,email,event_type,event_date,status,created_at";
}
