use crate::aggregate::{AggregateState, RankedEntry};
use std::{
    fmt::Display,
    io::{self, Write},
    str::FromStr,
};
use thiserror::Error;

pub const DEFAULT_TOP_N: usize = 10;

/// Output format for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Csv,
}

impl Format {
    pub const VARIANTS: &'static [&'static str] = &["text", "csv"];
}

#[derive(Debug, Error)]
#[error("unknown report format {0:?}, expected one of: text, csv")]
pub struct UnknownFormat(String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "csv" => Ok(Format::Csv),
            _ => Err(UnknownFormat(s.to_owned())),
        }
    }
}

/// One titled block of `key: count` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub title: &'static str,
    pub rows: Vec<(String, u64)>,
}

fn rows<K: Display>(entries: Vec<RankedEntry<K>>) -> Vec<(String, u64)> {
    entries.into_iter().map(|e| (e.key.to_string(), e.count)).collect()
}

/// The ranked views of a finished aggregation, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub total_requests: u64,
    pub sections: Vec<Section>,
}

impl Report {
    /// Addresses and request targets are cut to `top_n`, status codes are always listed in full.
    /// With `hourly`, an extra section lists every observed hour in hour order.
    pub fn new(state: &AggregateState, top_n: usize, hourly: bool) -> Self {
        let mut sections = vec![
            Section {
                name: "address",
                title: "Most Frequent IP Addresses",
                rows: rows(state.addresses().rank(Some(top_n))),
            },
            Section {
                name: "status",
                title: "Response Codes",
                rows: rows(state.statuses().rank(None)),
            },
            Section {
                name: "url",
                title: "Most Accessed URLs",
                rows: rows(state.request_targets().rank(Some(top_n))),
            },
        ];
        if hourly {
            sections.push(Section {
                name: "hour",
                title: "Requests by Hour",
                rows: state.hours().by_key().into_iter().map(|e| (format!("{:02}", e.key), e.count)).collect(),
            });
        }
        Self {
            total_requests: state.total_requests(),
            sections,
        }
    }

    pub fn write(&self, format: Format, writer: impl Write) -> io::Result<()> {
        match format {
            Format::Text => self.write_text(writer),
            Format::Csv => self.write_csv(writer).map_err(io::Error::from),
        }
    }

    pub fn write_text(&self, mut writer: impl Write) -> io::Result<()> {
        writeln!(writer, "Total Requests: {}", self.total_requests)?;
        for section in &self.sections {
            writeln!(writer, "\n{}:", section.title)?;
            for (key, count) in &section.rows {
                writeln!(writer, "{}: {}", key, count)?;
            }
        }
        writer.flush()
    }

    /// `section,key,count` rows, starting with a header and a `total` row.
    pub fn write_csv(&self, writer: impl Write) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["section", "key", "count"])?;
        csv.write_record(["total", "requests", self.total_requests.to_string().as_str()])?;
        for section in &self.sections {
            for (key, count) in &section.rows {
                csv.write_record([section.name, key.as_str(), count.to_string().as_str()])?;
            }
        }
        csv.flush()?;
        Ok(())
    }
}
