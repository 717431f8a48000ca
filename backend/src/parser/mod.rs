//! Extract loader with format, encoding and delimiter auto-detection.
//!
//! Turns an uploaded file into a typed [`RecordSet`]. Excel workbooks
//! (`.xlsx`, `.xls`) are recognized by their leading bytes and read from the
//! first sheet; anything else is decoded as delimited text. Loading is
//! all-or-nothing: a missing column, an unparseable date or a bad quantity
//! aborts the load with the offending line.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;

use crate::config::ColumnNames;
use crate::error::{LoadError, LoadResult};
use crate::models::{Record, RecordSet};

/// `YYYYMMDD`, optionally carrying the `.0` of a numeric spreadsheet cell.
static SALE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8})(?:\.0+)?$").expect("static regex"));

/// Largest accepted quantity. Sums of any realistic row count stay in `u64`.
pub const MAX_QUANTITY: u64 = u32::MAX as u64;

/// ZIP local file header, the container of `.xlsx`.
const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE2 compound document header, the container of `.xls`.
const XLS_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

/// Container format of a loaded extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    /// Sniff the format from the leading bytes.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(XLSX_MAGIC) {
            SourceFormat::Xlsx
        } else if bytes.starts_with(XLS_MAGIC) {
            SourceFormat::Xls
        } else {
            SourceFormat::Csv
        }
    }

    pub fn is_workbook(self) -> bool {
        !matches!(self, SourceFormat::Csv)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
        })
    }
}

/// Result of loading with metadata
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub records: RecordSet,
    pub format: SourceFormat,
    /// Detected encoding (text extracts only)
    pub encoding: Option<String>,
    /// Detected delimiter (text extracts only)
    pub delimiter: Option<char>,
    /// Header row as found in the file
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).into_owned()),
        // WHATWG maps the Latin-1 labels to Windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned())
        }
        label => encoding_rs::Encoding::for_label(label.as_bytes())
            .map(|enc| enc.decode(bytes).0.into_owned())
            .ok_or_else(|| LoadError::Encoding(format!("unsupported encoding '{}'", label))),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load a file with auto-detection.
pub fn load_file_auto<P: AsRef<Path>>(path: P, columns: &ColumnNames) -> LoadResult<LoadedTable> {
    let bytes = std::fs::read(path.as_ref())?;
    load_bytes_auto(&bytes, columns)
}

/// Load raw bytes with auto-detection of format, encoding and delimiter.
pub fn load_bytes_auto(bytes: &[u8], columns: &ColumnNames) -> LoadResult<LoadedTable> {
    let format = SourceFormat::detect(bytes);
    if format.is_workbook() {
        return load_workbook_bytes(bytes, columns);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    load_str(&content, delimiter, encoding, columns)
}

/// Load decoded text with an explicit delimiter.
pub fn load_str(
    content: &str,
    delimiter: char,
    encoding: String,
    columns: &ColumnNames,
) -> LoadResult<LoadedTable> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::Csv { line: 1, message: e.to_string() })?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    let layout = ColumnLayout::resolve(&headers, columns)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| LoadError::Csv {
            line: e.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
            message: e.to_string(),
        })?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or(idx + 2);

        if row.iter().all(|v| v.is_empty()) {
            continue;
        }

        records.push(layout.record(|idx| row.get(idx).unwrap_or(""), line)?);
    }

    Ok(LoadedTable {
        records: RecordSet::new(records),
        format: SourceFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        headers,
    })
}

/// Load the first sheet of an Excel workbook.
///
/// The first row of the sheet's used range is the header. Line numbers in
/// errors are 1-based sheet rows.
pub fn load_workbook_bytes(bytes: &[u8], columns: &ColumnNames) -> LoadResult<LoadedTable> {
    let format = SourceFormat::detect(bytes);
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| LoadError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::EmptyFile)?
        .map_err(|e| LoadError::Workbook(e.to_string()))?;

    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(LoadError::EmptyFile)?
        .iter()
        .map(|cell| cell_text(cell).trim().to_string())
        .collect();

    let layout = ColumnLayout::resolve(&headers, columns)?;

    let mut records = Vec::new();
    for (idx, row) in rows.enumerate() {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let line = first_line + idx + 1;
        let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");
        records.push(layout.record(cell, line)?);
    }

    Ok(LoadedTable {
        records: RecordSet::new(records),
        format,
        encoding: None,
        delimiter: None,
        headers,
    })
}

/// Cell value as the text the row parsers expect.
///
/// Numeric cells print without a trailing `.0`, so `20240101` stays a date.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(v) | Data::DateTimeIso(v) | Data::DurationIso(v) => v.clone(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.as_f64().to_string(),
        Data::Error(e) => e.to_string(),
    }
}

/// Header positions of the required columns.
struct ColumnLayout {
    store_code: usize,
    store_name: usize,
    coupon_name: usize,
    sale_date: usize,
    quantity: usize,
}

impl ColumnLayout {
    fn resolve(headers: &[String], columns: &ColumnNames) -> LoadResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
        };

        let positions: Vec<Option<usize>> = columns.all().iter().map(|&c| find(c)).collect();
        let missing: Vec<String> = columns
            .all()
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        match positions.as_slice() {
            [
                Some(store_code),
                Some(store_name),
                Some(coupon_name),
                Some(sale_date),
                Some(quantity),
            ] => Ok(Self {
                store_code: *store_code,
                store_name: *store_name,
                coupon_name: *coupon_name,
                sale_date: *sale_date,
                quantity: *quantity,
            }),
            _ => Err(LoadError::MissingColumns(missing)),
        }
    }

    fn record<'a>(&self, cell: impl Fn(usize) -> &'a str, line: usize) -> LoadResult<Record> {
        let field = |idx: usize| cell(idx).trim();

        Ok(Record {
            store_code: field(self.store_code).to_string(),
            store_name: field(self.store_name).to_string(),
            coupon_name: field(self.coupon_name).to_string(),
            sale_date: parse_sale_date(field(self.sale_date), line)?,
            quantity: parse_quantity(field(self.quantity), line)?,
        })
    }
}

/// Parse an 8-digit `YYYYMMDD` value into a calendar date.
pub fn parse_sale_date(value: &str, line: usize) -> LoadResult<NaiveDate> {
    let invalid = || LoadError::InvalidDate { line, value: value.to_string() };

    let digits = SALE_DATE_RE
        .captures(value.trim())
        .and_then(|c| c.get(1))
        .ok_or_else(invalid)?
        .as_str();

    let year: i32 = digits[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = digits[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = digits[6..8].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parse an integer-or-numeric quantity that must be a non-negative integer
/// no larger than [`MAX_QUANTITY`].
pub fn parse_quantity(value: &str, line: usize) -> LoadResult<u64> {
    let invalid = || LoadError::InvalidQuantity { line, value: value.to_string() };
    let value = value.trim();

    let q = match value.parse::<u64>() {
        Ok(q) => q,
        Err(_) => {
            let q: f64 = value.parse().map_err(|_| invalid())?;
            if !(q.is_finite() && q >= 0.0 && q.fract() == 0.0 && q <= MAX_QUANTITY as f64) {
                return Err(invalid());
            }
            q as u64
        }
    };

    if q > MAX_QUANTITY {
        return Err(invalid());
    }
    Ok(q)
}
