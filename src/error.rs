use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Malformed workbook: {0}")]
    MalformedWorkbook(String),

    #[error("No material selected: choose at least one hose type")]
    EmptyMaterialSelection,

    #[error("Unknown manager: {0}")]
    UnknownManager(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
