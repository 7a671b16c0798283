use std::io::Read;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Cell, RawSheet};

pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(_) | Data::Error(_) => Cell::Empty,
    }
}

fn header_names(row: &[Cell]) -> Vec<String> {
    row.iter().map(Cell::display_text).collect()
}

pub fn split_rows(name: &str, rows: Vec<Vec<Cell>>, header_row: usize) -> RawSheet {
    let mut rows = rows.into_iter().skip(header_row);
    let header = rows.next().map(|row| header_names(&row));
    RawSheet {
        name: name.to_string(),
        header,
        rows: rows.collect(),
    }
}

pub fn read_xlsx(path: &Path, header_row: usize) -> LedgerResult<Vec<RawSheet>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        LedgerError::MalformedWorkbook(format!("failed to open {}: {}", path.display(), e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            LedgerError::MalformedWorkbook(format!("failed to read sheet '{}': {}", sheet_name, e))
        })?;

        // Ranges start at the first used cell; pad back to absolute rows and
        // columns so the header row and first column line up with the sheet.
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; start_col as usize];
            cells.extend(row.iter().map(cell_from_data));
            rows.push(cells);
        }

        debug!("Sheet '{}': {} rows", sheet_name, rows.len());
        sheets.push(split_rows(&sheet_name, rows, header_row));
    }

    Ok(sheets)
}

pub fn read_csv_sheet<R: Read>(name: &str, reader: R, header_row: usize) -> LedgerResult<RawSheet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| {
            LedgerError::MalformedWorkbook(format!("CSV parse error at line {}: {}", line_num + 1, e))
        })?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::text(value)
                    }
                })
                .collect(),
        );
    }

    Ok(split_rows(name, rows, header_row))
}

pub fn read_sheets(path: &Path, header_row: usize) -> LedgerResult<Vec<RawSheet>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let sheets = if is_csv {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Hoja1")
            .to_string();
        let file = std::fs::File::open(path).map_err(|e| {
            LedgerError::MalformedWorkbook(format!("failed to open {}: {}", path.display(), e))
        })?;
        vec![read_csv_sheet(&name, file, header_row)?]
    } else {
        read_xlsx(path, header_row)?
    };

    info!("Read {} sheet(s) from {}", sheets.len(), path.display());
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Origin;
    use crate::normalize;

    const SAMPLE_CSV: &str = "\
CONTROL DE MANGUERAS,,,,,
Id,Items,Salida,Entrada,Fecha,Proceso
1,MANGUERA 1/2,50,,2026-01-05,obra norte
** TABLET **,,,,,
2,MANGUERA 1/2,30,5,2026-01-12,tablet
** DEVOLUCION **,,,,,
3,MANGUERA 3/4,abc,10,,devolucion
";

    #[test]
    fn csv_sheet_uses_second_row_as_header() {
        let sheet = read_csv_sheet("Gomez", SAMPLE_CSV.as_bytes(), 1).unwrap();
        assert_eq!(
            sheet.header,
            Some(
                ["Id", "Items", "Salida", "Entrada", "Fecha", "Proceso"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            )
        );
        assert_eq!(sheet.rows.len(), 5);
    }

    #[test]
    fn csv_sheet_normalizes_end_to_end() {
        let sheet = read_csv_sheet("Gomez", SAMPLE_CSV.as_bytes(), 1).unwrap();
        let ledger = normalize::build_ledger(&[sheet], &Config::default()).unwrap();

        assert_eq!(ledger.records.len(), 3);
        let origins: Vec<Origin> = ledger.records.iter().map(|r| r.origin).collect();
        assert_eq!(origins, vec![Origin::Normal, Origin::Tablet, Origin::Normal]);
        assert_eq!(ledger.records[0].returned, 0.0);
        assert_eq!(ledger.records[2].issued, 0.0);
        assert_eq!(ledger.records[2].returned, 10.0);
        assert_eq!(ledger.records[2].date, None);
    }

    #[test]
    fn short_sheet_has_no_header() {
        let sheet = split_rows("Vacia", vec![vec![Cell::text("titulo")]], 1);
        assert_eq!(sheet.header, None);
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn converts_calamine_cells() {
        assert_eq!(cell_from_data(&Data::Int(4)), Cell::Number(4.0));
        assert_eq!(cell_from_data(&Data::String(String::new())), Cell::Empty);
        assert_eq!(cell_from_data(&Data::String("N/A".into())), Cell::text("N/A"));
        assert_eq!(cell_from_data(&Data::Bool(true)), Cell::Bool(true));
    }

    #[test]
    fn missing_workbook_is_malformed() {
        let result = read_sheets(Path::new("does-not-exist.xlsx"), 1);
        assert!(matches!(result, Err(LedgerError::MalformedWorkbook(_))));
    }
}
