use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Record, Table};

/// A media gallery entry, keyed by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for GalleryItem {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Table for GalleryItem {
    const TABLE: &'static str = "gallery_items";
}
