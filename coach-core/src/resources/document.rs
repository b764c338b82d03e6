//! JSON documents returned by the service
//!
//! Field names match the local attribute names one-to-one. Numbers are
//! sometimes sent as strings, so numeric fields are read leniently.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// A child described only by its URI
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UriRef {
    pub uri: String,
}

/// Paging link attached to list-valued sections
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Link {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Whether the links announce another page
pub(crate) fn has_next(links: &[Link]) -> bool {
    links
        .iter()
        .any(|link| link.description.as_deref() == Some("next"))
}

/// Reference to a user inside another document
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserRef {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserDocument {
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_u8")]
    pub publicvisible: Option<u8>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub datecreated: Option<i64>,
    #[serde(default)]
    pub partnerships: Option<Vec<UriRef>>,
    #[serde(default)]
    pub subscriptions: Option<Vec<UriRef>>,
    #[serde(default)]
    pub links: Option<Vec<Link>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SportDocument {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartnershipDocument {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub datecreated: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u8")]
    pub publicvisible: Option<u8>,
    #[serde(default)]
    pub user1: Option<UserRef>,
    #[serde(default)]
    pub user2: Option<UserRef>,
    #[serde(default)]
    pub userconfirmed1: Option<bool>,
    #[serde(default)]
    pub userconfirmed2: Option<bool>,
    #[serde(default)]
    pub subscriptions: Option<Vec<UriRef>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionDocument {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub datesubscribed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u8")]
    pub publicvisible: Option<u8>,
    /// Items are keyed by the sport-qualified tag, e.g. `{"entryrunning": {"uri": ..}}`
    #[serde(default)]
    pub entries: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub links: Option<Vec<Link>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EntryDocument {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub datecreated: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub datemodified: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u8")]
    pub publicvisible: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub entrydate: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub entryduration: Option<u32>,
    #[serde(default)]
    pub entrylocation: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub numberofrounds: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub roundduration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub courselength: Option<u32>,
    #[serde(default)]
    pub coursetype: Option<String>,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub bicycletype: Option<String>,
}

/// Deserialize an optional integer that can be a number or a string
fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {}", n))),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid integer '{}': {}", s, e))),
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string")),
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    narrow(lenient_i64(deserializer)?)
}

fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    narrow(lenient_i64(deserializer)?)
}

fn lenient_u8<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    narrow(lenient_i64(deserializer)?)
}

fn narrow<T, E>(value: Option<i64>) -> std::result::Result<Option<T>, E>
where
    T: TryFrom<i64>,
    E: serde::de::Error,
{
    value
        .map(|v| T::try_from(v).map_err(|_| E::custom(format!("value {} out of range", v))))
        .transpose()
}

/// Dates arrive as `YYYY-MM-DD` (optionally with a time part) or as epoch milliseconds
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => {
            let day = s.trim().get(..10).unwrap_or(s.trim());
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", s, e)))
        }
        Some(JsonValue::Number(n)) => {
            let millis = n
                .as_i64()
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {}", n)))?;
            DateTime::from_timestamp_millis(millis)
                .map(|dt| Some(dt.date_naive()))
                .ok_or_else(|| D::Error::custom(format!("timestamp {} out of range", millis)))
        }
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected date string or timestamp")),
    }
}
