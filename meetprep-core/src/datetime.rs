//! Coercion of backend date values into UTC timestamps.
//!
//! Rows come back from the REST layer and from edge functions with whatever
//! representation the backend chose, so every date field goes through
//! [`parse_backend_datetime`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a date as the backend sends it.
///
/// Accepts RFC 3339, Postgres text timestamps (`2025-03-20 15:00:00+00`),
/// naive `2025-03-20T15:00:00` (taken as UTC) and bare `2025-03-20`
/// (midnight UTC).
pub fn parse_backend_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter for required date fields.
pub mod required {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_backend_datetime(&raw)
            .ok_or_else(|| D::Error::custom(format!("unrecognized date '{raw}'")))
    }
}

/// Serde adapter for optional date fields. `null` and missing both map to `None`.
pub mod optional {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_backend_datetime(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("unrecognized date '{raw}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_backend_datetime("2025-03-20T17:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap());
    }

    #[test]
    fn parses_postgres_text_timestamp() {
        let dt = parse_backend_datetime("2025-03-20 15:00:00+00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap());

        let dt = parse_backend_datetime("2025-03-20 15:00:00.250+00:00").unwrap();
        assert_eq!(dt.timestamp(), Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap().timestamp());
    }

    #[test]
    fn naive_values_are_utc() {
        let dt = parse_backend_datetime("2025-03-20T15:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap());

        let dt = parse_backend_datetime("2025-03-20").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_backend_datetime("next tuesday").is_none());
        assert!(parse_backend_datetime("").is_none());
    }
}
