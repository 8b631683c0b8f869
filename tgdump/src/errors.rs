//! Error types for the dump orchestrator.
//!
//! Two classes of failure are kept apart here. [`DiagnosticError`] covers
//! environment and server-side problems that end up in front of a user
//! (a missing table, a rejected commit, a broken connection). The remaining
//! [`DumpError`] variants signal misuse of the API: calling operations in the
//! wrong session state, passing unregistered targets, or routing a target to
//! an operation that cannot handle it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed error used to preserve the originating cause of a failure.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The main error type for dump operations.
#[derive(Debug, Error)]
pub enum DumpError {
    /// An environment or server-side failure, classified by kind.
    #[error(transparent)]
    Diagnostic(#[from] DiagnosticError),

    /// An operation was invoked in a session state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An argument was rejected before any work was attempted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No operation is able to handle the given target.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl DumpError {
    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates an unsupported operation error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Returns true if this is a diagnostic (user-facing) failure.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Diagnostic(_))
    }

    /// Returns the diagnostic kind, if this is a diagnostic failure.
    #[must_use]
    pub fn diagnostic_kind(&self) -> Option<DiagnosticKind> {
        match self {
            Self::Diagnostic(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Classification of diagnostic failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// The registration target does not exist in the database.
    TableNotFound,
    /// A statement could not be compiled or prepared.
    PrepareFailure,
    /// The transaction could not be started.
    BeginFailure,
    /// The dump execution was rejected by the server.
    OperationFailure,
    /// The commit was rejected.
    CommitFailure,
    /// A local or transport I/O failure.
    IoError,
    /// An uncategorized server-side failure.
    ServerError,
    /// An unexpected runtime failure.
    Unknown,
}

impl DiagnosticKind {
    /// Returns the stable code of this kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TableNotFound => "TABLE_NOT_FOUND",
            Self::PrepareFailure => "PREPARE_FAILURE",
            Self::BeginFailure => "BEGIN_FAILURE",
            Self::OperationFailure => "OPERATION_FAILURE",
            Self::CommitFailure => "COMMIT_FAILURE",
            Self::IoError => "IO_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified environment or server-side failure.
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct DiagnosticError {
    kind: DiagnosticKind,
    message: String,
    #[source]
    source: Option<BoxError>,
    suppressed: Vec<DiagnosticError>,
}

impl DiagnosticError {
    /// Creates a new diagnostic error without a cause.
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            suppressed: Vec::new(),
        }
    }

    /// Attaches the originating cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the kind of this failure.
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Returns the message of this failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the failures suppressed while this one was propagating.
    #[must_use]
    pub fn suppressed(&self) -> &[DiagnosticError] {
        &self.suppressed
    }

    /// Records a failure that occurred after this one.
    pub fn add_suppressed(&mut self, other: DiagnosticError) {
        self.suppressed.push(other);
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.kind.code()));
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(ref source) = self.source {
            map.insert("cause".to_string(), serde_json::json!(source.to_string()));
        }
        if !self.suppressed.is_empty() {
            let suppressed: Vec<serde_json::Value> = self
                .suppressed
                .iter()
                .map(|s| serde_json::json!(s.to_string()))
                .collect();
            map.insert("suppressed".to_string(), serde_json::Value::Array(suppressed));
        }
        map
    }
}

/// Failures reported by the external database client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A statement failed to compile.
    #[error("compile error: {0}")]
    Compile(String),

    /// A transport or local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other server-side failure.
    #[error("server error: {0}")]
    Server(String),
}

impl ClientError {
    /// Returns true if this is a transport or local I/O failure.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Classifies this failure, mapping I/O failures to [`DiagnosticKind::IoError`]
    /// and everything else to `otherwise`.
    #[must_use]
    pub fn classify(self, otherwise: DiagnosticKind, message: impl Into<String>) -> DiagnosticError {
        let kind = if self.is_io() {
            DiagnosticKind::IoError
        } else {
            otherwise
        };
        DiagnosticError::new(kind, message).with_source(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display_includes_code() {
        let err = DiagnosticError::new(DiagnosticKind::TableNotFound, "table 'T1' is not found");
        assert_eq!(err.to_string(), "[TABLE_NOT_FOUND] table 'T1' is not found");
    }

    #[test]
    fn test_diagnostic_source_is_preserved() {
        let cause = ClientError::Server("boom".to_string());
        let err = DiagnosticError::new(DiagnosticKind::ServerError, "failed").with_source(cause);

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "server error: boom");
    }

    #[test]
    fn test_classify_io() {
        let err = ClientError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            .classify(DiagnosticKind::BeginFailure, "begin");
        assert_eq!(err.kind(), DiagnosticKind::IoError);

        let err = ClientError::Server("rejected".to_string())
            .classify(DiagnosticKind::BeginFailure, "begin");
        assert_eq!(err.kind(), DiagnosticKind::BeginFailure);
    }

    #[test]
    fn test_dump_error_classes() {
        let diagnostic: DumpError = DiagnosticError::new(DiagnosticKind::Unknown, "x").into();
        assert!(diagnostic.is_diagnostic());
        assert_eq!(diagnostic.diagnostic_kind(), Some(DiagnosticKind::Unknown));

        let state = DumpError::invalid_state("not running");
        assert!(!state.is_diagnostic());
        assert!(state.diagnostic_kind().is_none());
    }

    #[test]
    fn test_to_dict_with_suppressed() {
        let mut err = DiagnosticError::new(DiagnosticKind::IoError, "close transaction");
        err.add_suppressed(DiagnosticError::new(DiagnosticKind::ServerError, "close client"));

        let dict = err.to_dict();
        assert_eq!(dict.get("code").unwrap(), "IO_ERROR");
        assert_eq!(dict.get("suppressed").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(err.suppressed().len(), 1);
    }

    #[test]
    fn test_kind_serialize() {
        let json = serde_json::to_string(&DiagnosticKind::CommitFailure).unwrap();
        assert_eq!(json, r#""COMMIT_FAILURE""#);
    }
}
