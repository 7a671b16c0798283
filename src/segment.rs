use crate::models::{Cell, Origin};

/// Two-state transition over the uppercased first-column text.
pub fn transition(state: Origin, row_text: &str) -> Origin {
    let upper = row_text.to_uppercase();
    if upper.contains("TABLET") {
        Origin::Tablet
    } else if upper.contains("DEVOLUCION") {
        Origin::Normal
    } else {
        state
    }
}

pub fn label_rows<'a, I>(first_column: I) -> Vec<Origin>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut state = Origin::Normal;
    first_column
        .into_iter()
        .map(|text| {
            state = transition(state, text);
            state
        })
        .collect()
}

pub fn first_cell_text(row: &[Cell]) -> String {
    match row.first() {
        None | Some(Cell::Empty) => "NAN".to_string(),
        Some(cell) => cell.display_text(),
    }
}

pub fn label_sheet_rows(rows: &[Vec<Cell>]) -> Vec<Origin> {
    let texts: Vec<String> = rows.iter().map(|row| first_cell_text(row)).collect();
    label_rows(texts.iter().map(String::as_str))
}
