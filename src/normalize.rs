use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::config::{ColumnConfig, Config};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Cell, Ledger, LedgerRecord, RawSheet};
use crate::segment;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

pub fn parse_number(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        Cell::Empty | Cell::DateTime(_) => return None,
    };

    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

pub fn parse_date(cell: &Cell, day_first: bool) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Text(s) => parse_date_text(s.trim(), day_first),
        _ => None,
    }
}

fn parse_date_text(text: &str, day_first: bool) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    parse_slash_date(text, day_first)
}

fn parse_slash_date(text: &str, day_first: bool) -> Option<NaiveDateTime> {
    let date_part = text.split_whitespace().next()?;
    let parts: Vec<&str> = date_part.split(['/', '-']).collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return None;
    }

    let a: u32 = parts[0].parse().ok()?;
    let b: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;

    let (first, second) = if day_first { ((b, a), (a, b)) } else { ((a, b), (b, a)) };
    NaiveDate::from_ymd_opt(year, first.0, first.1)
        .or_else(|| NaiveDate::from_ymd_opt(year, second.0, second.1))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

struct ColumnIndex {
    id: usize,
    item: usize,
    issued: Option<usize>,
    returned: Option<usize>,
    date: Option<usize>,
    process: Option<usize>,
}

impl ColumnIndex {
    fn locate(header: &[String], columns: &ColumnConfig) -> Option<Self> {
        let find = |name: &str| header.iter().position(|h| h == name);
        Some(Self {
            id: find(&columns.id)?,
            item: find(&columns.item)?,
            issued: find(&columns.issued),
            returned: find(&columns.returned),
            date: find(&columns.date),
            process: find(&columns.process),
        })
    }
}

static EMPTY: Cell = Cell::Empty;

fn cell_at(row: &[Cell], index: Option<usize>) -> &Cell {
    index.and_then(|i| row.get(i)).unwrap_or(&EMPTY)
}

pub fn normalize_sheet(sheet: &RawSheet, config: &Config) -> Option<Vec<LedgerRecord>> {
    let header = sheet.header.as_ref()?;
    let columns = ColumnIndex::locate(header, &config.columns)?;
    let origins = segment::label_sheet_rows(&sheet.rows);
    let day_first = config.ledger.day_first;

    let mut records = Vec::new();
    let mut decorative = 0usize;

    for (row, origin) in sheet.rows.iter().zip(origins) {
        let id = match parse_number(cell_at(row, Some(columns.id))) {
            Some(id) => id,
            None => {
                decorative += 1;
                continue;
            }
        };

        records.push(LedgerRecord {
            id,
            item: cell_at(row, Some(columns.item)).display_text(),
            sheet_name: sheet.name.clone(),
            origin,
            date: parse_date(cell_at(row, columns.date), day_first),
            issued: parse_number(cell_at(row, columns.issued)).unwrap_or(0.0),
            returned: parse_number(cell_at(row, columns.returned)).unwrap_or(0.0),
            process: cell_at(row, columns.process).display_text(),
        });
    }

    debug!(
        "Sheet '{}': {} records, {} decorative rows dropped",
        sheet.name,
        records.len(),
        decorative
    );

    Some(records)
}

pub fn build_ledger(sheets: &[RawSheet], config: &Config) -> LedgerResult<Ledger> {
    if sheets.is_empty() {
        return Err(LedgerError::MalformedWorkbook(
            "workbook has no sheets".to_string(),
        ));
    }

    let mut ledger = Ledger::default();
    let mut parsed = 0usize;

    for sheet in sheets {
        match normalize_sheet(sheet, config) {
            Some(records) => {
                parsed += 1;
                ledger.records.extend(records);
            }
            None => {
                warn!(
                    "Skipping sheet '{}': header row lacks '{}' or '{}'",
                    sheet.name, config.columns.id, config.columns.item
                );
                ledger.skipped_sheets.push(sheet.name.clone());
            }
        }
    }

    if parsed == 0 {
        return Err(LedgerError::MalformedWorkbook(format!(
            "none of the {} sheets has '{}' and '{}' columns",
            sheets.len(),
            config.columns.id,
            config.columns.item
        )));
    }

    Ok(ledger)
}
