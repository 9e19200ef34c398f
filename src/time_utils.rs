use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Clone, Copy)]
enum ParsedTimezone {
    Named(Tz),
    Fixed(FixedOffset),
}

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.chars().next()? {
        '+' => (1, &trimmed[1..]),
        '-' => (-1, &trimmed[1..]),
        _ => return None,
    };

    let rest = rest.trim();
    if rest.is_empty() || !rest.is_ascii() {
        return None;
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else if rest.len() > 2 {
        let (h, m) = rest.split_at(rest.len() - 2);
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_timezone(raw: &str) -> Option<ParsedTimezone> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_uppercase();
    if upper == "UTC" || upper == "GMT" {
        return FixedOffset::east_opt(0).map(ParsedTimezone::Fixed);
    }

    // "IST" is what HR exports usually carry for India.
    if upper == "IST" {
        return Some(ParsedTimezone::Named(chrono_tz::Asia::Kolkata));
    }

    if upper.starts_with("UTC") || upper.starts_with("GMT") {
        let offset = trimmed.get(3..).unwrap_or_default();
        if offset.is_empty() {
            return FixedOffset::east_opt(0).map(ParsedTimezone::Fixed);
        }
        if let Some(parsed) = parse_fixed_offset(offset) {
            return Some(ParsedTimezone::Fixed(parsed));
        }
    }

    if trimmed == "Asia/Calcutta" {
        return Some(ParsedTimezone::Named(chrono_tz::Asia::Kolkata));
    }

    trimmed.parse::<Tz>().ok().map(ParsedTimezone::Named)
}

pub fn normalize_timezone(raw: &str) -> Option<String> {
    parse_timezone(raw).map(|_| raw.trim().to_string())
}

/// Calendar date of `utc_dt` in `raw_tz`; unknown zones fall back to UTC.
pub fn local_date(raw_tz: &str, utc_dt: DateTime<Utc>) -> NaiveDate {
    match parse_timezone(raw_tz) {
        Some(ParsedTimezone::Named(tz)) => utc_dt.with_timezone(&tz).date_naive(),
        Some(ParsedTimezone::Fixed(offset)) => utc_dt.with_timezone(&offset).date_naive(),
        None => utc_dt.date_naive(),
    }
}

pub fn format_local_time(raw_tz: &str, utc_dt: DateTime<Utc>) -> String {
    match parse_timezone(raw_tz) {
        Some(ParsedTimezone::Named(tz)) => utc_dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string(),
        Some(ParsedTimezone::Fixed(offset)) => {
            utc_dt.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string()
        }
        None => utc_dt.format("%Y-%m-%d %H:%M").to_string(),
    }
}
