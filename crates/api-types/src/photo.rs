use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A stored photo: the original blob plus an optional derived thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct Photo {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number | null")]
    pub owner_id: Option<i64>,
    pub original_path: String,
    pub thumbnail_path: Option<String>,
    pub name: String,
    #[ts(type = "number")]
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serialized form of a photo as returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PhotoResponse {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number | null")]
    pub user: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Blob path of the original image.
    pub image: String,
    pub image_url: String,
    /// Empty when no thumbnail has been generated.
    pub thumbnail_url: String,
    pub size: String,
}

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Human readable size: whole bytes below 1 KB, two decimals above.
pub fn format_size(size_bytes: i64) -> String {
    let size = size_bytes as f64;
    if size < KB {
        format!("{} B", size_bytes)
    } else if size < MB {
        format!("{:.2} KB", size / KB)
    } else if size < GB {
        format!("{:.2} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn test_format_size_kilobytes() {
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
    }

    #[test]
    fn test_format_size_megabytes_and_gigabytes() {
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
