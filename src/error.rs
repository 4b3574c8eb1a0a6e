use std::fmt;
use std::path::PathBuf;

/// Error types for catalog loading, selection and extraction
#[derive(Debug)]
pub enum TlogError {
    /// I/O errors
    Io(std::io::Error),
    /// Source path does not carry the expected `.csv` suffix
    BadFileExtension(PathBuf),
    /// Source log contains bytes that are not valid UTF-8
    UnreadableEncoding {
        path: PathBuf,
        line: usize,
        source: std::str::Utf8Error,
    },
    /// Catalog line does not follow the `member.group` convention
    MalformedCatalogEntry { line: usize, content: String },
    /// Explicit destination directory is missing; the default name is used instead
    MissingDestinationDirectory(PathBuf),
    /// Group name not present in the catalog
    UnknownGroup(String),
    /// Member not present in the named catalog group
    UnknownParameter { group: String, member: String },
    /// Selection target could not be parsed
    InvalidTarget(String),
    /// Interactive command was not understood
    InvalidCommand(String),
    /// CSV writer errors
    #[cfg(feature = "csv")]
    Csv(csv::Error),
    /// Selection preset (de)serialization errors
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl fmt::Display for TlogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlogError::Io(err) => write!(f, "I/O error: {}", err),
            TlogError::BadFileExtension(path) => {
                write!(f, "Not a CSV file: {}", path.display())
            }
            TlogError::UnreadableEncoding { path, line, source } => write!(
                f,
                "Bad file type or corrupted file: {} (line {}: {})",
                path.display(),
                line,
                source
            ),
            TlogError::MalformedCatalogEntry { line, content } => write!(
                f,
                "Malformed catalog entry on line {}: '{}' (expected member.group)",
                line, content
            ),
            TlogError::MissingDestinationDirectory(path) => write!(
                f,
                "Destination directory does not exist: {}",
                path.display()
            ),
            TlogError::UnknownGroup(group) => write!(f, "Unknown parameter group: {}", group),
            TlogError::UnknownParameter { group, member } => {
                write!(f, "Unknown parameter: {}.{}", group, member)
            }
            TlogError::InvalidTarget(target) => write!(
                f,
                "Invalid selection '{}' (expected GROUP or GROUP.member)",
                target
            ),
            TlogError::InvalidCommand(msg) => write!(f, "{}", msg),
            #[cfg(feature = "csv")]
            TlogError::Csv(err) => write!(f, "CSV error: {}", err),
            #[cfg(feature = "json")]
            TlogError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for TlogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TlogError::Io(err) => Some(err),
            TlogError::UnreadableEncoding { source, .. } => Some(source),
            #[cfg(feature = "csv")]
            TlogError::Csv(err) => Some(err),
            #[cfg(feature = "json")]
            TlogError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TlogError {
    fn from(err: std::io::Error) -> Self {
        TlogError::Io(err)
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for TlogError {
    fn from(err: csv::Error) -> Self {
        TlogError::Csv(err)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for TlogError {
    fn from(err: serde_json::Error) -> Self {
        TlogError::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, TlogError>;
