//! SNTP time replies
//!
//! The modem reports time in C `asctime` layout, for example
//! `Thu Aug 04 14:48:05 2016`. Before the first successful sync it reports
//! the epoch, which [`is_synced`] filters out.

use time::{Date, Month, PrimitiveDateTime, Time};

use crate::AtError;

/// Replies older than this year mean the modem has not synced yet
pub const MIN_SYNCED_YEAR: i32 = 2024;

/// Parse an `asctime` string
pub fn parse_asctime(text: &str) -> Result<PrimitiveDateTime, AtError> {
    let mut fields = text.split_whitespace();
    let _weekday = fields.next().ok_or(AtError::Malformed)?;
    let month = fields.next().and_then(month_from_abbrev).ok_or(AtError::Malformed)?;
    let day: u8 = parse_field(fields.next())?;
    let clock = fields.next().ok_or(AtError::Malformed)?;
    let year: i32 = parse_field(fields.next())?;
    if fields.next().is_some() {
        return Err(AtError::Malformed);
    }

    let mut hms = clock.split(':');
    let hour: u8 = parse_field(hms.next())?;
    let minute: u8 = parse_field(hms.next())?;
    let second: u8 = parse_field(hms.next())?;
    if hms.next().is_some() {
        return Err(AtError::Malformed);
    }

    let date = Date::from_calendar_date(year, month, day).map_err(|_| AtError::Malformed)?;
    let time = Time::from_hms(hour, minute, second).map_err(|_| AtError::Malformed)?;
    Ok(PrimitiveDateTime::new(date, time))
}

/// Check whether a reply carries a real time rather than the epoch
pub fn is_synced(time: &PrimitiveDateTime) -> bool {
    time.year() >= MIN_SYNCED_YEAR
}

fn parse_field<T: core::str::FromStr>(field: Option<&str>) -> Result<T, AtError> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or(AtError::Malformed)
}

fn month_from_abbrev(name: &str) -> Option<Month> {
    let month = match name {
        "Jan" => Month::January,
        "Feb" => Month::February,
        "Mar" => Month::March,
        "Apr" => Month::April,
        "May" => Month::May,
        "Jun" => Month::June,
        "Jul" => Month::July,
        "Aug" => Month::August,
        "Sep" => Month::September,
        "Oct" => Month::October,
        "Nov" => Month::November,
        "Dec" => Month::December,
        _ => return None,
    };
    Some(month)
}
