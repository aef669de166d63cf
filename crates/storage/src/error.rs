use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Table {0} does not exist")]
    UnknownTable(String),
    #[error("Row has {got} cells but table {table} has {expected} columns")]
    RowWidth {
        table: String,
        expected: usize,
        got: usize,
    },
    #[error("Write to {0} rejected: {1}")]
    Rejected(String, String),
}
