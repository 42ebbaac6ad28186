use backtrace::Backtrace;
use parking_lot::RwLock;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for store operations
///
/// The first block mirrors the failure taxonomy of the store layer; the
/// remaining kinds cover plumbing failures (filesystem, encoding, network).
///
/// # Examples
///
/// ```rust
/// use matchstore::errors::{ErrorKind, StoreError, StoreResult};
///
/// fn example() -> StoreResult<()> {
///     Err(StoreError::new("store accessed before selection", ErrorKind::NotInitialized))
/// }
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::NotInitialized);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Store lifecycle and capability errors
    /// Store accessed before backend selection completed
    NotInitialized,
    /// Remote backend could not be constructed (recovered by falling back to the local store)
    BackendConstructionFailed,
    /// A collection file exists but could not be parsed
    CorruptCollectionFile,
    /// Stored document content is not a field map
    InvalidDocumentShape,
    /// The active backend does not implement the requested operation
    OperationNotSupported,
    /// A destructive administrative operation was attempted in production mode
    DestructiveOperationForbidden,

    // Addressing errors
    /// Collection name cannot be used as a storage unit
    InvalidCollectionName,
    /// Document id is empty or otherwise unusable
    InvalidDocumentId,

    // Query errors
    /// Error during filter construction or evaluation
    FilterError,

    // IO and storage errors
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// Error encoding or decoding data
    EncodingError,

    // Backend errors
    /// Error reported by the remote document database
    BackendError,

    /// The operation is not valid in the current context
    InvalidOperation,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotInitialized => write!(f, "Store not initialized"),
            ErrorKind::BackendConstructionFailed => write!(f, "Backend construction failed"),
            ErrorKind::CorruptCollectionFile => write!(f, "Corrupt collection file"),
            ErrorKind::InvalidDocumentShape => write!(f, "Invalid document shape"),
            ErrorKind::OperationNotSupported => write!(f, "Operation not supported"),
            ErrorKind::DestructiveOperationForbidden => {
                write!(f, "Destructive operation forbidden")
            }
            ErrorKind::InvalidCollectionName => write!(f, "Invalid collection name"),
            ErrorKind::InvalidDocumentId => write!(f, "Invalid document id"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Store error type.
///
/// `StoreError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured at construction.
///
/// ```rust
/// use matchstore::errors::{ErrorKind, StoreError};
///
/// let cause = StoreError::new("disk unplugged", ErrorKind::IOError);
/// let err = StoreError::new_with_cause("could not persist users", ErrorKind::IOError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct StoreError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StoreError>>,
    backtrace: Arc<RwLock<Backtrace>>,
}

impl StoreError {
    /// Creates a new `StoreError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    /// Creates a new `StoreError` wrapping the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StoreError) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StoreError> {
        self.cause.as_deref()
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        StoreError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<chrono::ParseError> for StoreError {
    fn from(err: chrono::ParseError) -> Self {
        StoreError::new(
            &format!("Timestamp parsing error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::new(&format!("Remote request failed: {}", err), ErrorKind::BackendError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_new_creates_error() {
        let error = StoreError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.cause().is_none());
    }

    #[test]
    fn store_error_with_cause_exposes_source() {
        let cause = StoreError::new("rename failed", ErrorKind::IOError);
        let error = StoreError::new_with_cause("commit failed", ErrorKind::IOError, cause);
        assert!(error.source().is_some());
        assert_eq!(error.cause().map(|c| c.message()), Some("rename failed"));
    }

    #[test]
    fn store_error_display_is_message() {
        let error = StoreError::new("clear forbidden", ErrorKind::DestructiveOperationForbidden);
        assert_eq!(format!("{}", error), "clear forbidden");
    }

    #[test]
    fn store_error_debug_contains_cause_chain() {
        let cause = StoreError::new("root", ErrorKind::FileNotFound);
        let error = StoreError::new_with_cause("top", ErrorKind::BackendConstructionFailed, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("top"));
        assert!(formatted.contains("Caused by:"));
        assert!(formatted.contains("root"));
    }

    #[test]
    fn error_kind_display_names_taxonomy() {
        assert_eq!(ErrorKind::NotInitialized.to_string(), "Store not initialized");
        assert_eq!(
            ErrorKind::OperationNotSupported.to_string(),
            "Operation not supported"
        );
        assert_eq!(
            ErrorKind::DestructiveOperationForbidden.to_string(),
            "Destructive operation forbidden"
        );
    }

    #[test]
    fn from_io_error_maps_kind() {
        let not_found: StoreError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(not_found.kind(), &ErrorKind::FileNotFound);

        let denied: StoreError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(denied.kind(), &ErrorKind::PermissionDenied);

        let other: StoreError = std::io::Error::other("boom").into();
        assert_eq!(other.kind(), &ErrorKind::IOError);
        assert!(other.message().contains("IO error"));
    }

    #[test]
    fn from_json_error_is_encoding_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let store_err: StoreError = err.into();
        assert_eq!(store_err.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn question_mark_converts_parse_errors() {
        fn parse() -> StoreResult<chrono::DateTime<chrono::FixedOffset>> {
            Ok(chrono::DateTime::parse_from_rfc3339("yesterday")?)
        }
        assert_eq!(parse().unwrap_err().kind(), &ErrorKind::EncodingError);
    }
}
