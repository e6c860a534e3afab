use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Missing columns in {table}: {}", .columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("No rows match the selected filters")]
    EmptySelection,

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}

impl PanelError {
    pub fn missing_columns(table: &str, columns: &[&str]) -> Self {
        PanelError::MissingColumns {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
