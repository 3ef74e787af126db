use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Utc};

/// Feed list timestamp, e.g. `Jul 22  4:26 am`.
pub fn format_feed_time(created_at: i64) -> String {
    match Local.timestamp_opt(created_at, 0).single() {
        Some(dt) => format_feed_time_in(dt),
        None => String::new(),
    }
}

pub fn format_feed_time_in<Tz: TimeZone>(dt: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}  {}", dt.format("%b %-d"), clock(&dt))
}

/// Relative date used in mail lists:
/// today `4:26 am`, yesterday `Yesterday 4:26 am`, this year `Jul 22 / 4:26 am`,
/// otherwise `22-07-2021 / 4:26 am`.
pub fn format_date(now: DateTime<Utc>, when: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let day = when.date_naive();

    if day == today {
        clock(&when)
    } else if day == today - Duration::days(1) {
        format!("Yesterday {}", clock(&when))
    } else if day.year() == today.year() {
        format!("{} / {}", when.format("%b %-d"), clock(&when))
    } else {
        format!("{} / {}", when.format("%d-%m-%Y"), clock(&when))
    }
}

/// `h:mm a` with a lowercase meridiem.
fn clock<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%-I:%M %P").to_string()
}
