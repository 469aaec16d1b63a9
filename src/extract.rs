use chrono::{DateTime, Datelike, Timelike};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ADDRESS_REGEX: Regex = Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").unwrap();
    static ref STATUS_REGEX: Regex = Regex::new(r" (\d{3}) ").unwrap();
    static ref REQUEST_REGEX: Regex =
        Regex::new(r#""(?:GET|POST|PUT|DELETE|HEAD|OPTIONS|PATCH) (.+?) HTTP/\d\.\d""#).unwrap();
    static ref TIMESTAMP_REGEX: Regex =
        Regex::new(r"\[(\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2} [+-]\d{4})\]").unwrap();
}

const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// The fields pulled out of a single access log line.
/// Every field is independent: `None` only means that line didn't match that field's pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub address: Option<String>,
    pub status: Option<String>,
    pub request_target: Option<String>,
    pub hour: Option<u32>,
}

impl Extraction {
    /// Run every field matcher against `line`. Never fails, a malformed field just comes back as `None`.
    pub fn from_line(line: &str) -> Self {
        Self {
            address: address(line),
            status: status(line),
            request_target: request_target(line),
            hour: hour(line),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.status.is_none() && self.request_target.is_none() && self.hour.is_none()
    }
}

/// Leading dotted quad. Octets are matched by digit count only, so `999.1.1.1` is accepted.
pub fn address(line: &str) -> Option<String> {
    ADDRESS_REGEX.find(line).map(|m| m.as_str().to_owned())
}

/// The leftmost space-delimited three digit token, without the spaces.
/// A request path containing something like ` 123 ` ahead of the real status will win instead.
pub fn status(line: &str) -> Option<String> {
    STATUS_REGEX.captures(line).map(|c| c[1].to_owned())
}

/// The target of a quoted `"METHOD target HTTP/x.y"` request line.
pub fn request_target(line: &str) -> Option<String> {
    REQUEST_REGEX.captures(line).map(|c| c[1].to_owned())
}

/// Hour of day from a `[DD/Mon/YYYY:HH:MM:SS +ZZZZ]` timestamp, in the timestamp's own offset.
/// Leap seconds (`:60`) and year `0000` are treated as invalid.
pub fn hour(line: &str) -> Option<u32> {
    let captures = TIMESTAMP_REGEX.captures(line)?;
    let dt = DateTime::parse_from_str(&captures[1], TIMESTAMP_FORMAT).ok()?;
    // chrono represents a leap second as a nanosecond value past one second
    if dt.nanosecond() >= 1_000_000_000 || dt.year() < 1 {
        return None;
    }
    Some(dt.hour())
}
