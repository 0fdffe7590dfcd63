//! Centralized error types for gtdmail.

use thiserror::Error;

/// All errors produced by the gtdmail library.
#[derive(Error, Debug)]
pub enum GtdError {
    /// No directory under `Organization/` or `People/` matches the address.
    #[error("Mailbox not found: {0}")]
    MailboxNotFound(String),

    /// The message is not present in any probed folder.
    #[error("Message '{filename}' not found in mailbox {mailbox}")]
    MessageNotFound { mailbox: String, filename: String },

    /// The message exceeds the inbox size guard.
    #[error("Message '{path}' is {size} bytes, over the {limit} byte limit")]
    Oversized { path: String, size: u64, limit: u64 },

    /// The `.eml` content could not be decoded.
    #[error("Failed to decode '{path}': {reason}")]
    Decoding { path: String, reason: String },

    /// Building the `.eml` wire format failed.
    #[error("Failed to encode message: {0}")]
    Encoding(String),

    /// Storage I/O error with the associated workspace-relative path.
    #[error("Storage error on '{path}': {source}")]
    Storage {
        path: String,
        source: std::io::Error,
    },

    /// A caller-supplied value was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias for `Result<T, GtdError>`.
pub type Result<T> = std::result::Result<T, GtdError>;

impl GtdError {
    /// Create a `Storage` variant from a path and an `io::Error`.
    pub fn storage(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Stable taxonomy name rendered in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MailboxNotFound(_) => "MailboxNotFoundError",
            Self::MessageNotFound { .. } => "MessageNotFoundError",
            Self::Oversized { .. } => "OversizedMessageError",
            Self::Decoding { .. } => "DecodingError",
            Self::Encoding(_) => "EncodingError",
            Self::Storage { .. } => "StorageError",
            Self::InvalidArgument(_) => "InvalidArgumentError",
        }
    }

    /// `true` when the underlying storage reported a missing path.
    ///
    /// Unresolved mailboxes and messages are not storage misses.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(
            GtdError::MailboxNotFound("a@b".into()).kind(),
            "MailboxNotFoundError"
        );
        assert_eq!(GtdError::Encoding("x".into()).kind(), "EncodingError");
    }

    #[test]
    fn test_is_not_found() {
        let err = GtdError::storage(
            "People/x/new/1.eml",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());

        let err = GtdError::storage(
            "People/x/new/1.eml",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_not_found());
        assert!(!GtdError::MailboxNotFound("a@b".into()).is_not_found());
        assert!(!GtdError::MessageNotFound {
            mailbox: "a@b".into(),
            filename: "1.eml".into(),
        }
        .is_not_found());
    }
}
