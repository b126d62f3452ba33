use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;

/// Parse a feed `date` value into a civil datetime.
///
/// Accepts RFC 3339 timestamps (converted to UTC), civil datetimes and bare
/// `YYYY-MM-DD` dates. Returns `None` for anything else.
pub fn parse_feed_date(raw: &str) -> Option<DateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts.to_zoned(TimeZone::UTC).datetime());
    }
    if let Ok(dt) = raw.parse::<DateTime>() {
        return Some(dt);
    }
    raw.parse::<Date>().ok().map(|date| date.to_datetime(jiff::civil::Time::midnight()))
}

/// Machine-readable value for a card's `datetime` attribute.
///
/// Unparseable input is passed through trimmed.
pub fn normalized_date(raw: &str) -> String {
    match parse_feed_date(raw) {
        Some(dt) => dt.date().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Human-readable fallback used when the feed carries no `displayDate`.
pub fn fallback_display_date(raw: &str) -> String {
    match parse_feed_date(raw) {
        Some(dt) => dt.strftime("%d/%m/%Y").to_string(),
        None => raw.trim().to_string(),
    }
}
