//! Error types for LuaSQL operations.
//!
//! `Display` renders the message a script sees after the `"LuaSQL: "` prefix,
//! so driver code can hand an [`Error`] straight to [`crate::fail`] or raise it
//! as a Lua error.

use crate::lua::{LUASQL_PREFIX, ObjectKind};
use std::fmt;

/// The primary error type for all LuaSQL operations.
#[derive(Debug)]
pub enum Error {
    /// Establishing a connection failed
    Connection(ConnectionError),
    /// Query, prepare or result retrieval failed
    Query(QueryError),
    /// Operation on an object that was already closed
    Closed(ObjectKind),
    /// Bad argument passed from a script
    Argument(String),
    /// Invalid connection configuration
    Config(ConfigError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// The server rejected a check on an open connection
    Disconnected,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    /// Server or client error number, when the driver reports one
    pub code: Option<u16>,
    pub sqlstate: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Executing a statement failed
    Execute,
    /// Preparing a statement failed
    Prepare,
    /// Reading a result set failed
    Retrieve,
    /// A parameter could not be bound
    Bind,
}

impl QueryErrorKind {
    fn prefix(self) -> &'static str {
        match self {
            QueryErrorKind::Execute => "error executing query. MySQL: ",
            QueryErrorKind::Prepare => "error preparing statement. MySQL: ",
            QueryErrorKind::Retrieve => "error retrieving result. MySQL: ",
            QueryErrorKind::Bind => "error executing query. ",
        }
    }
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Is this a failure of the link to the server rather than of a statement?
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Driver error number, if available
    pub fn code(&self) -> Option<u16> {
        match self {
            Error::Query(q) => q.code,
            _ => None,
        }
    }

    /// Get SQLSTATE if available (e.g., "42S02" for a missing table)
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sqlstate.as_deref(),
            _ => None,
        }
    }

    /// Convert into a raised Lua error carrying the prefixed message.
    pub fn into_lua_error(self) -> mlua::Error {
        mlua::Error::RuntimeError(format!("{LUASQL_PREFIX}{self}"))
    }
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            sqlstate: None,
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "{e}"),
            Error::Query(e) => write!(f, "{e}"),
            Error::Closed(kind) => write!(f, "{} is closed", kind.short_name()),
            Error::Argument(msg) => write!(f, "{msg}"),
            Error::Config(e) => write!(f, "invalid connection configuration: {}", e.message),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConnectionErrorKind::Connect => {
                write!(f, "error connecting to database. MySQL: {}", self.message)
            }
            ConnectionErrorKind::Disconnected => f.write_str(&self.message),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<Error> for mlua::Error {
    fn from(err: Error) -> Self {
        err.into_lua_error()
    }
}

/// Result type alias for LuaSQL operations.
pub type Result<T> = std::result::Result<T, Error>;
