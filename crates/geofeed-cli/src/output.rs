//! Rendering of feed entries for `geofeed show`.

use std::fmt::Write;

use geofeed_core::FeedEntry;
use serde::Serialize;
use serde_json::Value;

use crate::config::OutputFormat;

/// Maximum title width in table output.
const TITLE_WIDTH: usize = 60;

/// Flat, serializable view of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryRecord {
    pub external_id: String,
    pub title: Option<String>,
    /// Kilometres from home; absent when the entry has no usable geometry.
    pub distance_km: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub attribution: Option<String>,
    pub attributes: Value,
}

impl EntryRecord {
    pub fn from_entry<A: Serialize>(entry: &FeedEntry<A>) -> Self {
        let position = entry.coordinates();
        Self {
            external_id: entry.external_id.clone(),
            title: entry.title.clone(),
            distance_km: Some(entry.distance_to_home).filter(|d| d.is_finite()),
            latitude: position.map(|p| p.latitude),
            longitude: position.map(|p| p.longitude),
            attribution: entry.attribution.clone(),
            attributes: serde_json::to_value(&entry.attributes).unwrap_or(Value::Null),
        }
    }
}

/// Renders records in the requested format, newline-terminated.
pub fn render(records: &[EntryRecord], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(records)),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(records)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Jsonl => {
            let mut out = String::new();
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Csv => Ok(render_csv(records)),
    }
}

fn render_table(records: &[EntryRecord]) -> String {
    let id_width = records
        .iter()
        .map(|r| r.external_id.chars().count())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<id_width$}  {:>10}  {:>10}  {:>11}  TITLE",
        "ID", "DIST (KM)", "LAT", "LON"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:>10}  {:>10}  {:>11}  {}",
            record.external_id,
            format_number(record.distance_km, 1),
            format_number(record.latitude, 4),
            format_number(record.longitude, 4),
            truncate_text(record.title.as_deref().unwrap_or("-"), TITLE_WIDTH),
        );
    }
    out
}

fn render_csv(records: &[EntryRecord]) -> String {
    let mut out =
        String::from("external_id,title,distance_km,latitude,longitude,attribution\n");
    for record in records {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            escape_csv(&record.external_id),
            record.title.as_deref().map(escape_csv).unwrap_or_default(),
            record.distance_km.map(|d| d.to_string()).unwrap_or_default(),
            record.latitude.map(|v| v.to_string()).unwrap_or_default(),
            record.longitude.map(|v| v.to_string()).unwrap_or_default(),
            record.attribution.as_deref().map(escape_csv).unwrap_or_default(),
        );
    }
    out
}

fn format_number(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

/// Truncate text to a maximum length, adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        let truncated: String = cleaned.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

/// Escape a string for CSV output
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofeed_core::{Coordinate, Geometry};
    use serde_json::json;

    fn record() -> EntryRecord {
        let entry = FeedEntry::new(
            Coordinate::new(-31.0, 150.0),
            "1234",
            Some(Geometry::point(151.0, -30.0)),
            json!({"mag": 3.0}),
        )
        .with_title(Some("M 3.0 - 10km N of Somewhere, NSW".to_string()))
        .with_attribution(Some("Feed Title".to_string()));
        EntryRecord::from_entry(&entry)
    }

    #[test]
    fn test_record_from_entry() {
        let record = record();
        assert_eq!(record.external_id, "1234");
        assert_eq!(record.latitude, Some(-30.0));
        assert_eq!(record.longitude, Some(151.0));
        assert!((record.distance_km.unwrap() - 146.8).abs() < 0.1);
        assert_eq!(record.attributes["mag"], 3.0);
    }

    #[test]
    fn test_record_without_geometry() {
        let entry = FeedEntry::new(Coordinate::new(0.0, 0.0), "x", None, ());
        let record = EntryRecord::from_entry(&entry);
        assert!(record.distance_km.is_none());
        assert!(record.latitude.is_none());
        assert_eq!(record.attributes, Value::Null);
    }

    #[test]
    fn test_render_jsonl() {
        let out = render(&[record(), record()], OutputFormat::Jsonl).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["external_id"], "1234");
        assert_eq!(parsed["attribution"], "Feed Title");
    }

    #[test]
    fn test_render_json_array() {
        let out = render(&[record()], OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_render_csv_escapes_fields() {
        let out = render(&[record()], OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "external_id,title,distance_km,latitude,longitude,attribution"
        );
        assert!(lines[1].starts_with("1234,\"M 3.0 - 10km N of Somewhere, NSW\","));
        assert!(lines[1].ends_with(",-30,151,Feed Title"));
    }

    #[test]
    fn test_render_table() {
        let out = render(&[record()], OutputFormat::Table).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID  "));
        assert!(lines[1].contains("146.8"));
        assert!(lines[1].contains("-30.0000"));
        assert!(lines[1].ends_with("M 3.0 - 10km N of Somewhere, NSW"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], OutputFormat::Jsonl).unwrap(), "");
        assert_eq!(render(&[], OutputFormat::Json).unwrap(), "[]\n");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a  b\n c", 10), "a b c");
        assert_eq!(truncate_text("abcdefghij", 5), "abcde...");
    }
}
