pub mod history;
pub mod sessions;
pub mod words;

use chrono::{DateTime, SecondsFormat, Utc};

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, raw, "unparseable stored timestamp");
            DateTime::<Utc>::default()
        })
}
