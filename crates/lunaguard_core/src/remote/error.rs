use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Coarse failure class, used for log error codes and fallback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Network,
    Auth,
    Rejected,
    Schema,
}

impl RemoteErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Network => "remote_network",
            Self::Auth => "remote_auth",
            Self::Rejected => "remote_rejected",
            Self::Schema => "remote_schema",
        }
    }
}

/// Backend call failure. Always recoverable by falling back to the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Unreachable host, DNS failure, TLS failure or timeout.
    Network { table: String, cause: String },
    /// 401/403 from the backend.
    Auth {
        table: String,
        status: u16,
        cause: String,
    },
    /// Any other non-success status.
    Rejected {
        table: String,
        status: u16,
        cause: String,
    },
    /// Response body or row did not match the expected shape.
    Schema { table: String, cause: String },
}

impl RemoteError {
    pub fn network(table: &str, cause: impl Into<String>) -> Self {
        Self::Network {
            table: table.to_string(),
            cause: cause.into(),
        }
    }

    pub fn schema(table: &str, cause: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_string(),
            cause: cause.into(),
        }
    }

    /// Classifies an HTTP status into `Auth` or `Rejected`.
    pub fn from_status(table: &str, status: u16, cause: impl Into<String>) -> Self {
        let table = table.to_string();
        let cause = cause.into();
        match status {
            401 | 403 => Self::Auth {
                table,
                status,
                cause,
            },
            _ => Self::Rejected {
                table,
                status,
                cause,
            },
        }
    }

    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Network { .. } => RemoteErrorKind::Network,
            Self::Auth { .. } => RemoteErrorKind::Auth,
            Self::Rejected { .. } => RemoteErrorKind::Rejected,
            Self::Schema { .. } => RemoteErrorKind::Schema,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Network { table, .. }
            | Self::Auth { table, .. }
            | Self::Rejected { table, .. }
            | Self::Schema { table, .. } => table,
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network { table, cause } => write!(f, "backend unreachable ({table}): {cause}"),
            Self::Auth {
                table,
                status,
                cause,
            } => write!(f, "backend refused credentials ({table}, {status}): {cause}"),
            Self::Rejected {
                table,
                status,
                cause,
            } => write!(f, "backend rejected request ({table}, {status}): {cause}"),
            Self::Schema { table, cause } => {
                write!(f, "unexpected backend data ({table}): {cause}")
            }
        }
    }
}

impl Error for RemoteError {}
