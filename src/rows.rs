//! Lenient decoding of flat export rows.
//!
//! Records are exported as flat JSON objects whose per-visit fields carry a
//! numeric suffix (`anc3_urinalysis`, `pnc_visit_2`). Values that do not
//! parse are read as absent, so one bad cell never drops a whole record.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

/// A single exported row, keyed by column name.
pub type Row = Map<String, Value>;

/// Typed, forgiving accessors over a [`Row`].
#[derive(Debug, Clone, Copy)]
pub struct RowReader<'a> {
    row: &'a Row,
}

impl<'a> RowReader<'a> {
    pub fn new(row: &'a Row) -> Self {
        Self { row }
    }

    fn value(&self, key: &str) -> Option<&'a Value> {
        match self.row.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    /// Non-empty text value, trimmed. Numbers are rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
            _ => None,
        }
    }

    /// Boolean flag. Accepts `true`, non-zero numbers, and "yes"/"true"/"y"/"1".
    pub fn flag(&self, key: &str) -> bool {
        match self.value(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "1"
            ),
            _ => false,
        }
    }

    /// Calendar date in `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339 form.
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        match self.value(key)? {
            Value::String(s) => parse_date(s),
            _ => None,
        }
    }

    /// Non-negative whole number, from a JSON number or a numeric string.
    pub fn number(&self, key: &str) -> Option<u32> {
        match self.value(key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
                        .map(|v| v as u64)
                })
                .and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        }
    }

    /// Like [`RowReader::number`], with absent or malformed values read as zero.
    pub fn count(&self, key: &str) -> u32 {
        self.number(key).unwrap_or(0)
    }

    /// Nested object, e.g. a breakdown keyed by reason.
    pub fn object(&self, key: &str) -> Option<&'a Row> {
        match self.value(key)? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Objects inside a nested array. Entries that are not objects are skipped.
    pub fn objects(&self, key: &str) -> impl Iterator<Item = &'a Row> {
        let items = match self.value(key) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };
        items.iter().filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
