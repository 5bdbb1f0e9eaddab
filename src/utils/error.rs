use std::fmt;
use thiserror::Error;

/// Which part of the input document was missing or malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaErrorKind {
    MissingExtraSection,
    MissingTagsSection,
    MissingCoordinatesSection,
    MissingCoordinateField {
        index: usize,
        field: &'static str,
    },
    InvalidCoordinateField {
        index: usize,
        field: &'static str,
        value: String,
    },
    MalformedSection {
        section: String,
        expected: &'static str,
    },
    InvalidTagColor {
        tag: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    pub fn new(kind: SchemaErrorKind) -> Self {
        Self { kind }
    }
}

impl From<SchemaErrorKind> for SchemaError {
    fn from(kind: SchemaErrorKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaErrorKind::MissingExtraSection => write!(f, "JSON contains no extra section"),
            SchemaErrorKind::MissingTagsSection => {
                write!(f, "JSON extra data contains no tags")
            }
            SchemaErrorKind::MissingCoordinatesSection => {
                write!(f, "JSON contains no customCoordinates section")
            }
            SchemaErrorKind::MissingCoordinateField { index, field } => {
                write!(f, "coordinate #{} has no '{}' field", index, field)
            }
            SchemaErrorKind::InvalidCoordinateField {
                index,
                field,
                value,
            } => write!(f, "coordinate #{} has an invalid '{}' value: {}", index, field, value),
            SchemaErrorKind::MalformedSection { section, expected } => {
                write!(f, "section '{}' must be {}", section, expected)
            }
            SchemaErrorKind::InvalidTagColor { tag } => {
                write!(f, "tag '{}' has an unreadable color", tag)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

#[derive(Error, Debug)]
pub enum GeoDeckError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Tag '{tag}' has no locations")]
    EmptyTag { tag: String },

    #[error("Rendering tag '{tag}' failed: {message}")]
    Render { tag: String, message: String },

    #[error("Package export failed: {message}")]
    Export { message: String },

    #[error("Deck contains no cards")]
    EmptyDeck,

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Render,
    Export,
    Config,
    Io,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GeoDeckError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GeoDeckError::Schema(_) | GeoDeckError::SerializationError(_) => ErrorCategory::Schema,
            GeoDeckError::EmptyTag { .. } | GeoDeckError::Render { .. } => ErrorCategory::Render,
            GeoDeckError::Export { .. } | GeoDeckError::ZipError(_) => ErrorCategory::Export,
            GeoDeckError::ConfigError { .. } | GeoDeckError::InvalidConfigValueError { .. } => {
                ErrorCategory::Config
            }
            GeoDeckError::IoError(_) => ErrorCategory::Io,
            GeoDeckError::EmptyDeck | GeoDeckError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一標籤的問題只會讓該卡片被略過
            GeoDeckError::EmptyTag { .. } | GeoDeckError::Render { .. } => ErrorSeverity::Low,
            GeoDeckError::IoError(_) => ErrorSeverity::Medium,
            GeoDeckError::Export { .. } | GeoDeckError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GeoDeckError::Schema(e) => format!("ERROR: {}", e),
            GeoDeckError::SerializationError(e) => {
                format!("ERROR: input is not valid JSON ({})", e)
            }
            GeoDeckError::EmptyDeck => {
                "ERROR: no tag produced a card, refusing to write an empty deck".to_string()
            }
            GeoDeckError::InvalidConfigValueError { field, reason, .. } => {
                format!("ERROR: {}: {}", field, reason)
            }
            other => format!("ERROR: {}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Schema => {
                "Check that the input JSON has 'customCoordinates' and 'extra.tags' sections"
            }
            ErrorCategory::Render => "Check the coordinates of the affected tag",
            ErrorCategory::Export => "Check that the output location is writable",
            ErrorCategory::Config => "Run with --help to see the accepted options",
            ErrorCategory::Io => "Check file paths and permissions",
            ErrorCategory::Processing => {
                "Make sure at least one tag has coordinates, or allow empty decks"
            }
        }
    }

    /// Wraps a schema problem into the crate error.
    pub fn schema(kind: SchemaErrorKind) -> Self {
        GeoDeckError::Schema(SchemaError::new(kind))
    }
}

pub type Result<T> = std::result::Result<T, GeoDeckError>;
