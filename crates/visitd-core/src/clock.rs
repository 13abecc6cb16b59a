//! Site-local clock.
//!
//! Visits are stamped in the site's civil timezone rather than whatever
//! zone the server happens to run in, so the hour buckets line up with the
//! operator's day regardless of deployment region.

use chrono::{DateTime, FixedOffset, Utc};

/// The site's civil timezone: America/Sao_Paulo (UTC-3, no DST).
pub const SITE_TZ: FixedOffset = FixedOffset::west_opt(3 * 3600).unwrap();

/// Current time in the site timezone.
pub fn local_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&SITE_TZ)
}

/// Formats a timestamp as the "HH:MM" bucket label used by the hourly
/// histogram and the visitor detail list.
pub fn hour_label(at: DateTime<FixedOffset>) -> String {
    at.format("%H:%M").to_string()
}
