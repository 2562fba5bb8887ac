use thiserror::Error;

/// All errors that can occur in libris-core.
#[derive(Debug, Error)]
pub enum LibrisError {
    #[error("Library file {path} is corrupt: {message}")]
    StorageCorrupt { path: String, message: String },

    #[error("Library file uses schema version {found}, this build supports up to {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Ambiguous book id prefix: {0}")]
    AmbiguousId(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LibrisError {
    pub(crate) fn corrupt(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        Self::StorageCorrupt {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Short machine-readable kind, used in JSON error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StorageCorrupt { .. } => "storage_corrupt",
            Self::UnsupportedSchema { .. } => "unsupported_schema",
            Self::BookNotFound(_) => "not_found",
            Self::AmbiguousId(_) => "ambiguous_id",
            Self::Validation(_) => "invalid_args",
            Self::Config(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::StorageCorrupt { .. } | Self::UnsupportedSchema { .. } => {
                ExitCode::StorageCorrupt
            }
            Self::BookNotFound(_) => ExitCode::NotFound,
            Self::AmbiguousId(_) | Self::Validation(_) => ExitCode::InvalidArgs,
            Self::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Process exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    StorageCorrupt = 5,
    ConfirmRequired = 8,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

pub type Result<T> = std::result::Result<T, LibrisError>;
