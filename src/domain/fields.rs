//! Ordered alias lists for payload fields whose spelling varies between
//! upstream sources, resolved as "first non-empty candidate wins".

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub const ID_KEYS: &[&str] = &["id", "_id", "lead_id", "leadId"];
pub const NAME_KEYS: &[&str] = &[
    "name",
    "full_name",
    "fullName",
    "Name",
    "lead_name",
    "contact_name",
    "first_name",
];
pub const EMAIL_KEYS: &[&str] = &["email", "email_address", "emailAddress", "Email", "contact_email"];
pub const PHONE_KEYS: &[&str] = &[
    "phone",
    "phone_number",
    "phoneNumber",
    "mobile",
    "Phone",
    "contact_number",
    "whatsapp_number",
];
pub const SOURCE_KEYS: &[&str] = &["source", "lead_source"];
pub const SOURCE_TYPE_KEYS: &[&str] = &["source_type", "sourceType"];
pub const CAMPAIGN_KEYS: &[&str] = &["campaign", "campaign_name", "campaignName", "ad_campaign"];

/// Renders a scalar as text; blank strings, nulls and containers yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn first_non_empty(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(scalar_text)
}

/// Accepts ids sent either as strings or as numbers.
pub fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_text(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

pub fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}

/// Lenient timestamp: RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` read as UTC.
/// Anything unparseable becomes `None` instead of failing the whole record.
pub fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
