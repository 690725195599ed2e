pub mod analytics;
pub mod orders;
pub mod products;
pub mod users;

use chrono::{DateTime, Utc};

/// Calendar date in the `YYYY-MM-DD` form the dashboard displays
pub(crate) fn format_day(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}
