pub mod alert;
pub mod news;
pub mod price;
pub mod summary;

pub use alert::{Direction, PriceAlert};
pub use news::{NewsItem, SourceType};
pub use price::{PricePoint, PriceSnapshot};
pub use summary::DailySummary;

/// Unix seconds -> RFC 3339, as the JSON API exposes timestamps.
pub fn ts_to_rfc3339(ts: i64) -> Option<String> {
    chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0).map(|d| d.to_rfc3339())
}
