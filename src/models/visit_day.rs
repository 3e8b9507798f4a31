use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DeserializeAs, SerializeAs};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

/// Wire representation of a visit day.
///
/// Written as an RFC 3339 timestamp at UTC midnight, the shape the shelter
/// front end splits on `T`. Read back from either a bare `YYYY-MM-DD` or any
/// RFC 3339 timestamp, keeping the UTC calendar day.
pub struct VisitDay;

pub fn parse_visit_day(input: &str) -> Result<Date, time::error::Parse> {
    let input = input.trim();
    if input.len() == 10 {
        return Date::parse(input, format_description!("[year]-[month]-[day]"));
    }
    OffsetDateTime::parse(input, &Rfc3339).map(|ts| ts.to_offset(UtcOffset::UTC).date())
}

pub fn format_visit_day(day: Date) -> String {
    // a UTC midnight always formats; the fallback only keeps this infallible
    day.midnight()
        .assume_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| day.to_string())
}

impl SerializeAs<Date> for VisitDay {
    fn serialize_as<S>(source: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format_visit_day(*source).serialize(serializer)
    }
}

impl<'de> DeserializeAs<'de, Date> for VisitDay {
    fn deserialize_as<D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_visit_day(&raw).map_err(|e| {
            serde::de::Error::custom(format!("invalid visit date '{}': {}", raw, e))
        })
    }
}
