use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("table {0:?} already exists")]
    TableAlreadyExists(String),
    #[error("table {0:?} does not exist")]
    TableNotExist(String),
    #[error("invalid table name {0:?}")]
    InvalidTableName(String),
    #[error("invalid field name {0:?}")]
    InvalidFieldName(String),
    #[error("too many fields declared for table {0:?} (max 1024)")]
    TooManyFields(String),
    #[error("key value {0:?} exceeds the 255-byte limit")]
    KeyValueTooLong(String),
    #[error("value for field {0:?} exceeds the 16MiB-1 limit")]
    FieldValueTooLong(String),
    #[error("row {key:?} in table {table:?} not found")]
    RowNotFound { table: String, key: String },
    #[error("backend error: {0}")]
    Backend(String),
}

pub type TableResult<T> = Result<T, TableError>;
