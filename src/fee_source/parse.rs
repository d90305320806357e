//! Fee row decoding for JSON and CSV payloads
//!
//! Accepted shapes:
//! - JSON object of `column: value`
//! - JSON array of such objects (first one wins), optionally under `"data"`
//! - JSON `{"values": [[header...], [row...]]}` as returned by spreadsheet APIs
//! - CSV with a header row and one data row (wide layout)
//! - CSV with `name,value` rows (tall layout)
//!
//! Cells may be numbers or text like `"4,91%"` or `"3,000 VND"`. Flat amounts
//! accept either `,` or `.` thousands grouping, so `"1.620"` reads as 1620.
//! Unknown columns and unreadable cells are skipped, leaving those fields
//! unset.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::Value;

use crate::error::PricingError;
use crate::pricing::format::parse_numeric_input;
use crate::pricing::{parse_fee_label, FeeField, FeeTableOverride};

/// Payload encoding of a fee row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// Sniff from the payload
    Auto,
    Json,
    Csv,
}

impl RowFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Some(RowFormat::Auto),
            "json" => Some(RowFormat::Json),
            "csv" => Some(RowFormat::Csv),
            _ => None,
        }
    }

    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_lowercase();
        if ct.contains("json") {
            RowFormat::Json
        } else if ct.contains("csv") {
            RowFormat::Csv
        } else {
            RowFormat::Auto
        }
    }
}

/// Decode a fee row in the given format
pub fn parse_fee_row(body: &str, format: RowFormat) -> Result<FeeTableOverride> {
    match format {
        RowFormat::Json => parse_json_row(body),
        RowFormat::Csv => parse_csv_row(body),
        RowFormat::Auto => {
            let trimmed = body.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                parse_json_row(body)
            } else {
                parse_csv_row(body)
            }
        }
    }
}

fn cell_value(field: FeeField, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let first_digit = raw.find(|c: char| c.is_ascii_digit())?;
    if field.is_percent() {
        // Labels drop the sign; keep it so the merge can reject the cell
        let pct = parse_fee_label(raw);
        if raw[..first_digit].contains('-') {
            Some(-pct)
        } else {
            Some(pct)
        }
    } else {
        parse_numeric_input(&strip_dot_grouping(raw))
    }
}

/// Sheets export amounts with `.` thousands grouping ("1.620", "50.000").
/// A `.` between a digit and exactly three digits is a group separator.
fn strip_dot_grouping(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == '.' && i > 0 && chars[i - 1].is_ascii_digit() {
            let run = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if run == 3 {
                continue;
            }
        }
        out.push(*c);
    }
    out
}

fn json_cell(field: FeeField, value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => cell_value(field, s),
        _ => None,
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a JSON fee row
pub fn parse_json_row(body: &str) -> Result<FeeTableOverride> {
    let value: Value = serde_json::from_str(body)
        .map_err(PricingError::from)
        .context("Fee row is not valid JSON")?;
    let row = row_from_json(&value)
        .ok_or_else(|| PricingError::EmptyFeeRow("unrecognized JSON shape".to_string()))?;
    Ok(row)
}

fn row_from_json(value: &Value) -> Option<FeeTableOverride> {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("values") {
                return row_from_table(rows);
            }
            if let Some(data) = map.get("data") {
                return row_from_json(data);
            }
            let mut row = FeeTableOverride::default();
            for (column, cell) in map {
                if let Some(field) = FeeField::from_column(column) {
                    if let Some(v) = json_cell(field, cell) {
                        row.set(field, v);
                    }
                }
            }
            Some(row)
        }
        Value::Array(items) => match items.first()? {
            Value::Array(_) => row_from_table(items),
            first => row_from_json(first),
        },
        _ => None,
    }
}

/// `[[header...], [row...]]`
fn row_from_table(rows: &[Value]) -> Option<FeeTableOverride> {
    let header = rows.first()?.as_array()?;
    let data = rows.get(1)?.as_array()?;
    let mut row = FeeTableOverride::default();
    for (column, cell) in header.iter().zip(data) {
        let Some(field) = json_text(column).as_deref().and_then(FeeField::from_column) else {
            continue;
        };
        if let Some(v) = json_cell(field, cell) {
            row.set(field, v);
        }
    }
    Some(row)
}

/// Decode a CSV fee row, wide or tall layout
pub fn parse_csv_row(body: &str) -> Result<FeeTableOverride> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let records: Vec<StringRecord> = reader
        .records()
        .collect::<Result<_, csv::Error>>()
        .map_err(PricingError::from)
        .context("Failed to read fee CSV")?;

    let header = records
        .first()
        .ok_or_else(|| PricingError::EmptyFeeRow("empty CSV".to_string()))?;
    // Tall files carry a value on their very first line
    let is_tall = header.len() == 2
        && header
            .get(1)
            .map_or(false, |cell| cell.chars().any(|c| c.is_ascii_digit()));

    let mut row = FeeTableOverride::default();
    if !is_tall {
        // wide: header row + first data row
        let columns: Vec<Option<FeeField>> = header.iter().map(FeeField::from_column).collect();
        let data = records
            .get(1)
            .ok_or_else(|| PricingError::EmptyFeeRow("CSV header without data row".to_string()))?;
        for (field, cell) in columns.iter().zip(data.iter()) {
            if let Some(field) = field {
                if let Some(v) = cell_value(*field, cell) {
                    row.set(*field, v);
                }
            }
        }
    } else {
        // tall: one `name,value` pair per line
        for record in &records {
            let (Some(name), Some(cell)) = (record.get(0), record.get(1)) else {
                continue;
            };
            if let Some(field) = FeeField::from_column(name) {
                if let Some(v) = cell_value(field, cell) {
                    row.set(field, v);
                }
            }
        }
    }
    Ok(row)
}
