//! Date helper functions

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format a publication date as `YYYY-MM-DD` in the site timezone
pub fn format_date(date: &DateTime<Utc>, tz: Tz) -> String {
    date.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Format a date for RSS (`pubDate`, RFC 2822)
pub fn date_rfc2822(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}
