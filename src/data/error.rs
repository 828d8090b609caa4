use thiserror::Error;

// ---------------------------------------------------------------------------
// Schema errors – raised while loading / classifying a table
// ---------------------------------------------------------------------------

/// A table whose shape or label columns cannot be accepted.
///
/// Row numbers are zero-based data rows (the header is not counted).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("label column '{column}' has invalid value '{value}' at row {row} (expected 1 or empty)")]
    InvalidLabelValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("label column '{column}' has an empty label name")]
    EmptyLabelName { column: String },

    #[error("row {row} has {found} fields but the header declares {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

impl SchemaError {
    /// Name of the offending column, when the error is about a single column.
    pub fn column(&self) -> Option<&str> {
        match self {
            SchemaError::InvalidLabelValue { column, .. }
            | SchemaError::EmptyLabelName { column }
            | SchemaError::LengthMismatch { column, .. }
            | SchemaError::DuplicateColumn(column) => Some(column),
            SchemaError::RaggedRow { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Label errors – rejected LabelStore mutations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("label name must not be empty")]
    EmptyName,

    #[error("label '{0}' already exists")]
    AlreadyDeclared(String),

    #[error("label '{0}' does not exist")]
    Unknown(String),

    #[error("row {index} is out of range for a table of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("label prefix must not be empty")]
    EmptyLabelPrefix,

    #[error("snap window must be at least 1 row")]
    ZeroSnapWindow,
}
