use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

/// Map a technical symbol to the name traders know it by.
pub fn display_name(symbol: &str) -> &str {
    match symbol {
        "^NDX" | "NDX" | "^IXIC" | "IXIC" => "NAS100",
        "^DJI" | "DJI" | "US30" => "US30",
        "^GSPC" | "SPX" => "SPX500",
        other => other,
    }
}

/// Signals generated over the weekend are for Monday's session.
pub fn trading_date(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    match today.weekday() {
        Weekday::Sat => today + Duration::days(2),
        Weekday::Sun => today + Duration::days(1),
        _ => today,
    }
}

pub fn is_weekend(now: DateTime<Utc>) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}
