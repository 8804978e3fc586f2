use crate::domain::ports::{Convert, DecodeContext, EncodeContext};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Smallest and largest integers read as `yyyymmdd` dates.
const MIN_INTEGER_DATE: i64 = 19000101;
const MAX_INTEGER_DATE: i64 = 99991231;

const VERBOSE_FORMAT: &str = "%a %b %d %Y %H:%M:%S";

/// Textual date layouts, in the order they are tried on fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// `2017-02-05T17:03:13.000-03:00`
    MillisOffset,
    /// `Tue Jun 3 2008 11:05:30 GMT`
    Verbose,
    /// `2016-11-01T21:14:33Z`
    Iso8601,
    /// `2018/02/15`
    Slashes,
    /// `2018-02-15`
    Dashes,
    /// `20180215`
    Compact,
}

impl DateFormat {
    pub const ALL: [DateFormat; 6] = [
        DateFormat::MillisOffset,
        DateFormat::Verbose,
        DateFormat::Iso8601,
        DateFormat::Slashes,
        DateFormat::Dashes,
        DateFormat::Compact,
    ];

    pub fn format(self, date: &DateTime<Utc>) -> String {
        match self {
            DateFormat::MillisOffset => date.to_rfc3339_opts(SecondsFormat::Millis, true),
            DateFormat::Verbose => format!("{} GMT", date.format(VERBOSE_FORMAT)),
            DateFormat::Iso8601 => date.to_rfc3339_opts(SecondsFormat::Secs, true),
            DateFormat::Slashes => date.format("%Y/%m/%d").to_string(),
            DateFormat::Dashes => date.format("%Y-%m-%d").to_string(),
            DateFormat::Compact => date.format("%Y%m%d").to_string(),
        }
    }

    /// Parses `text` in this layout, then in every other layout when
    /// `fallback` is set.
    pub fn parse(self, text: &str, fallback: bool) -> Option<DateTime<Utc>> {
        let parsed = self.parse_exact(text);
        if parsed.is_some() || !fallback {
            return parsed;
        }
        DateFormat::ALL
            .iter()
            .filter(|format| **format != self)
            .find_map(|format| format.parse_exact(text))
    }

    fn parse_exact(self, text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        match self {
            DateFormat::MillisOffset => {
                if !has_fractional_seconds(text) {
                    return None;
                }
                DateTime::parse_from_rfc3339(text).ok().map(|d| d.with_timezone(&Utc))
            }
            DateFormat::Iso8601 => {
                if has_fractional_seconds(text) {
                    return None;
                }
                DateTime::parse_from_rfc3339(text).ok().map(|d| d.with_timezone(&Utc))
            }
            DateFormat::Verbose => parse_verbose(text),
            DateFormat::Slashes => parse_day(text, "%Y/%m/%d"),
            DateFormat::Dashes => parse_day(text, "%Y-%m-%d"),
            DateFormat::Compact => parse_day(text, "%Y%m%d"),
        }
    }
}

fn has_fractional_seconds(text: &str) -> bool {
    text.split_once('T')
        .map(|(_, time)| time.contains('.'))
        .unwrap_or(false)
}

fn parse_day(text: &str, format: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(text, format).ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn parse_verbose(text: &str) -> Option<DateTime<Utc>> {
    let (stamp, zone) = text.rsplit_once(' ')?;
    let offset = parse_zone(zone)?;
    let naive = NaiveDateTime::parse_from_str(stamp, VERBOSE_FORMAT).ok()?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// Accepts `GMT`, `UTC`, `Z`, and `GMT+hh:mm` / `UTC-hhmm` style offsets.
fn parse_zone(zone: &str) -> Option<FixedOffset> {
    let rest = zone
        .strip_prefix("GMT")
        .or_else(|| zone.strip_prefix("UTC"))
        .unwrap_or(zone);
    if rest.is_empty() || rest == "Z" {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// An optional date written in a fixed layout.
#[derive(Debug, Clone, Copy)]
pub struct Date {
    format: DateFormat,
}

impl Date {
    pub const fn new(format: DateFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> DateFormat {
        self.format
    }
}

impl Convert for Date {
    type Value = Option<DateTime<Utc>>;

    fn default_value(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn decode(&self, raw: &Value, _ctx: DecodeContext) -> Option<Option<DateTime<Utc>>> {
        let parsed = match raw {
            Value::String(text) => self.format.parse(text, true),
            Value::Number(n) => {
                // Possibly an integer date like yyyymmdd
                let candidate = n.as_i64().or_else(|| n.as_f64().map(|v| v.trunc() as i64))?;
                if (MIN_INTEGER_DATE..=MAX_INTEGER_DATE).contains(&candidate) {
                    DateFormat::Compact.parse(&candidate.to_string(), false)
                } else {
                    None
                }
            }
            _ => None,
        };
        if parsed.is_none() {
            tracing::debug!("Unparseable date value {} for {:?}", raw, self.format);
        }
        parsed.map(Some)
    }

    fn encode(&self, value: &Option<DateTime<Utc>>, _ctx: EncodeContext) -> Option<Value> {
        value.as_ref().map(|date| Value::String(self.format.format(date)))
    }
}
