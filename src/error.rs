//! Error types for the DB2 dialect.

use std::fmt;

use thiserror::Error;

/// Messages the DB2 CLI driver reports once a connection handle is gone.
const DISCONNECT_MESSAGES: [&str; 3] = [
    "Connection is not active",
    "connection is no longer active",
    "Connection Resource cannot be found",
];

/// The main error type for dialect operations.
#[derive(Debug, Error)]
pub enum DialectError {
    /// Failed to parse a connection URL.
    #[error("Invalid connection URL at position {position}: {message}")]
    Url { position: usize, message: String },

    /// The connection URL parsed but lacks a part the connect string needs.
    #[error("Connection URL is missing {0}")]
    MissingUrlPart(&'static str),

    /// A named placeholder had no value in the parameter list.
    #[error("No value bound for parameter :{0}")]
    MissingParam(String),

    /// A catalog query returned a row of an unexpected shape.
    #[error("Unexpected catalog row: {0}")]
    Catalog(String),

    /// Error raised by the driver, passed through unchanged.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DialectError {
    /// Create a URL parse error at the given position.
    pub fn url(position: usize, message: impl Into<String>) -> Self {
        Self::Url {
            position,
            message: message.into(),
        }
    }

    /// Create a catalog row error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }

    /// Whether this error came from the driver and signals a dead connection.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Driver(e) if e.is_disconnect())
    }
}

/// Result type alias for dialect operations.
pub type DialectResult<T> = Result<T, DialectError>;

/// DB-API exception classes a driver can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    Interface,
    Database,
    Data,
    Operational,
    Integrity,
    Internal,
    Programming,
    NotSupported,
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interface => "InterfaceError",
            Self::Database => "DatabaseError",
            Self::Data => "DataError",
            Self::Operational => "OperationalError",
            Self::Integrity => "IntegrityError",
            Self::Internal => "InternalError",
            Self::Programming => "ProgrammingError",
            Self::NotSupported => "NotSupportedError",
        };
        f.write_str(name)
    }
}

/// An error reported by the driver behind a [`Connection`](crate::connection::Connection).
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
    /// Five-character SQLSTATE, when the driver supplied one.
    pub sqlstate: Option<String>,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sqlstate: None,
        }
    }

    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    /// Whether the error indicates the connection is no longer usable.
    ///
    /// Only programming and operational errors are inspected; the pool uses
    /// the answer to decide whether to discard the connection.
    pub fn is_disconnect(&self) -> bool {
        match self.kind {
            DriverErrorKind::Programming | DriverErrorKind::Operational => {
                let text = self.to_string();
                DISCONNECT_MESSAGES.iter().any(|m| text.contains(m))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DialectError::url(9, "expected '://'");
        assert_eq!(
            err.to_string(),
            "Invalid connection URL at position 9: expected '://'"
        );
    }

    #[test]
    fn test_disconnect_messages() {
        for msg in DISCONNECT_MESSAGES {
            let err = DriverError::new(DriverErrorKind::Operational, format!("[IBM][CLI Driver] {msg}"));
            assert!(err.is_disconnect(), "{msg}");
        }
        let err = DriverError::new(
            DriverErrorKind::Programming,
            "SQLSTATE=08003 connection is no longer active",
        );
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_disconnect_requires_error_kind() {
        let err = DriverError::new(DriverErrorKind::Integrity, "Connection is not active");
        assert!(!err.is_disconnect());

        let err = DriverError::new(DriverErrorKind::Operational, "SQL0911N deadlock or timeout");
        assert!(!err.is_disconnect());
    }

    #[test]
    fn test_dialect_error_wraps_driver() {
        let err: DialectError =
            DriverError::new(DriverErrorKind::Operational, "Connection is not active").into();
        assert!(err.is_disconnect());
        assert_eq!(err.to_string(), "OperationalError: Connection is not active");
        assert!(!DialectError::Config("x".into()).is_disconnect());
    }
}
