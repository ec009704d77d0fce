use chrono::{DateTime, Utc};

/// A hydrated detail record and when it was stored.
///
/// Entries never go stale on their own; `cached_at` only feeds the age label.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub record: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(record: T) -> Self {
        Self {
            record,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_label(self.age_minutes())
    }
}

/// Render an age in minutes as `just now`, `5m ago`, `2h ago` or `3d ago`.
/// Hours round up from 30 minutes, days from 12 hours.
pub fn age_label(minutes: i64) -> String {
    match minutes {
        // Negative ages come from clock skew.
        m if m < 1 => "just now".to_string(),
        m if m < 60 => format!("{}m ago", m),
        m if m < 1440 => {
            let hours = m / 60 + i64::from(m % 60 >= 30);
            format!("{}h ago", hours)
        }
        m => {
            let days = m / 1440 + i64::from((m % 1440) / 60 >= 12);
            format!("{}d ago", days)
        }
    }
}
