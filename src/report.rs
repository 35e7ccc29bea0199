//! Report rendering.
//!
//! A report is a banner, the eight sections in fixed order, and a closing
//! banner. [`ReportSink`] receives those pieces; [`TextReport`] writes the
//! operator-facing layout and [`JsonReport`] a single JSON document.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::format::title_case;
use crate::health::TIMESTAMP_FORMAT;
use crate::section::{Section, Value};

const BANNER_WIDTH: usize = 60;
const RULE_WIDTH: usize = 30;
const WARNING_PREFIX: &str = "⚠️  ";

pub const DEFAULT_MAX_ADDRESSES: usize = 2;

/// The report sections, in print order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    System,
    Bios,
    Cpu,
    Memory,
    Temperature,
    Disk,
    Network,
    Health,
}

impl SectionKind {
    pub const ALL: [SectionKind; 8] = [
        SectionKind::System,
        SectionKind::Bios,
        SectionKind::Cpu,
        SectionKind::Memory,
        SectionKind::Temperature,
        SectionKind::Disk,
        SectionKind::Network,
        SectionKind::Health,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            SectionKind::System => "SYSTEM INFORMATION:",
            SectionKind::Bios => "BIOS/MOTHERBOARD INFORMATION:",
            SectionKind::Cpu => "CPU STATUS:",
            SectionKind::Memory => "MEMORY STATUS:",
            SectionKind::Temperature => "TEMPERATURE SENSORS:",
            SectionKind::Disk => "DISK STATUS:",
            SectionKind::Network => "NETWORK INTERFACES:",
            SectionKind::Health => "SYSTEM HEALTH CHECK:",
        }
    }

    /// Key used in structured output.
    pub fn key(&self) -> &'static str {
        match self {
            SectionKind::System => "system",
            SectionKind::Bios => "bios",
            SectionKind::Cpu => "cpu",
            SectionKind::Memory => "memory",
            SectionKind::Temperature => "temperature",
            SectionKind::Disk => "disk",
            SectionKind::Network => "network",
            SectionKind::Health => "health",
        }
    }
}

/// Destination for a report.
pub trait ReportSink {
    fn begin(&mut self, scan_time: DateTime<Local>) -> io::Result<()>;
    fn section(&mut self, kind: SectionKind, section: &Section) -> io::Result<()>;
    fn finish(&mut self) -> io::Result<()>;
}

/// Plain text layout for terminals and line-oriented scrapers.
pub struct TextReport<W: Write> {
    out: W,
    max_addresses: usize,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W, max_addresses: usize) -> Self {
        Self { out, max_addresses }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "=".repeat(BANNER_WIDTH))
    }

    fn write_plain(&mut self, section: &Section) -> io::Result<()> {
        for (label, value) in section.iter() {
            writeln!(self.out, "{}: {}", label, display_value(value))?;
        }
        writeln!(self.out)
    }

    fn write_temperature(&mut self, section: &Section) -> io::Result<()> {
        if let Some(status) = section.get_text("Status") {
            writeln!(self.out, "{}", status)?;
            return writeln!(self.out);
        }

        for (name, value) in section.iter() {
            writeln!(self.out, "{}:", name)?;
            for reading in value.as_list().unwrap_or_default() {
                writeln!(
                    self.out,
                    "  {}: {} (High: {}, Critical: {})",
                    field(reading, "label"),
                    field(reading, "current"),
                    field(reading, "high"),
                    field(reading, "critical"),
                )?;
            }
        }
        writeln!(self.out)
    }

    fn write_disks(&mut self, section: &Section) -> io::Result<()> {
        for (device, value) in section.iter() {
            writeln!(self.out, "{}:", device)?;
            match value {
                Value::Group(info) => {
                    for (key, value) in info.iter() {
                        writeln!(self.out, "  {}: {}", key, display_value(value))?;
                    }
                }
                other => writeln!(self.out, "  {}", display_value(other))?,
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_network(&mut self, section: &Section) -> io::Result<()> {
        for (name, value) in section.iter() {
            writeln!(self.out, "{}:", name)?;
            if let Some(info) = value.as_group() {
                writeln!(self.out, "  Status: {}", field(info, "Status"))?;
                writeln!(self.out, "  Speed: {}", field(info, "Speed"))?;
                let addresses = info
                    .get("Addresses")
                    .and_then(Value::as_list)
                    .unwrap_or_default();
                for addr in addresses.iter().take(self.max_addresses) {
                    writeln!(
                        self.out,
                        "  {}: {}",
                        field(addr, "Family"),
                        field(addr, "Address")
                    )?;
                }
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_health(&mut self, section: &Section) -> io::Result<()> {
        for (key, value) in section.iter() {
            let label = title_case(&key.replace('_', " "));
            let prefix = if key.to_lowercase().contains("warning") {
                WARNING_PREFIX
            } else {
                ""
            };
            writeln!(self.out, "{}{}: {}", prefix, label, display_value(value))?;
        }
        writeln!(self.out)
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn begin(&mut self, scan_time: DateTime<Local>) -> io::Result<()> {
        self.banner()?;
        writeln!(self.out, "MOTHERBOARD & SYSTEM STATUS CHECK")?;
        self.banner()?;
        writeln!(self.out, "Scan Time: {}", scan_time.format(TIMESTAMP_FORMAT))?;
        writeln!(self.out)
    }

    fn section(&mut self, kind: SectionKind, section: &Section) -> io::Result<()> {
        writeln!(self.out, "{}", kind.header())?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        match kind {
            SectionKind::Temperature => self.write_temperature(section),
            SectionKind::Disk => self.write_disks(section),
            SectionKind::Network => self.write_network(section),
            SectionKind::Health => self.write_health(section),
            _ => self.write_plain(section),
        }?;
        self.out.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        self.banner()?;
        writeln!(self.out, "SCAN COMPLETE")?;
        self.banner()?;
        self.out.flush()
    }
}

/// Collects the sections and writes one pretty-printed JSON object on finish.
pub struct JsonReport<W: Write> {
    out: W,
    scan_time: String,
    sections: Vec<(SectionKind, Section)>,
}

impl<W: Write> JsonReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            scan_time: String::new(),
            sections: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

struct JsonDocument<'a> {
    scan_time: &'a str,
    sections: &'a [(SectionKind, Section)],
}

impl Serialize for JsonDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 1))?;
        map.serialize_entry("scan_time", self.scan_time)?;
        for (kind, section) in self.sections {
            map.serialize_entry(kind.key(), section)?;
        }
        map.end()
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn begin(&mut self, scan_time: DateTime<Local>) -> io::Result<()> {
        self.scan_time = scan_time.format(TIMESTAMP_FORMAT).to_string();
        self.sections.clear();
        Ok(())
    }

    fn section(&mut self, kind: SectionKind, section: &Section) -> io::Result<()> {
        self.sections.push((kind, section.clone()));
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        let document = JsonDocument {
            scan_time: &self.scan_time,
            sections: &self.sections,
        };
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

fn field<'a>(section: &'a Section, label: &str) -> &'a str {
    section.get_text(label).unwrap_or(crate::format::NOT_AVAILABLE)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Group(group) => group
            .iter()
            .map(|(k, v)| format!("{}: {}", k, display_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Value::List(items) => format!("[{} entries]", items.len()),
    }
}
