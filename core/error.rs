// Error taxonomy for every transport operation
use crate::types::IoOp;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Empty host name, or the resolver reported the name does not exist.
    #[error("unknown host '{host}'")]
    UnknownHost { host: String },

    /// Every resolved address was tried and none accepted the connection.
    #[error("cannot connect to host ({attempts} address(es) tried)")]
    ConnectionFailed { attempts: usize },

    #[error("{op} timed out")]
    Timeout { op: IoOp },

    #[error("not connected")]
    NotConnected,

    #[error("error while trying to {op} on socket: {source}")]
    Io {
        op: IoOp,
        #[source]
        source: io::Error,
    },

    #[error("server closed connection unexpectedly")]
    UnexpectedClose,

    /// Irrecoverable OS or resolver failure.
    #[error("system error: {context}")]
    System {
        context: String,
        #[source]
        source: Option<io::Error>,
    },
}

impl TransportError {
    pub fn io(op: IoOp, source: io::Error) -> Self {
        TransportError::Io { op, source }
    }

    pub fn system(context: impl Into<String>) -> Self {
        TransportError::System {
            context: context.into(),
            source: None,
        }
    }

    pub fn system_with(context: impl Into<String>, source: io::Error) -> Self {
        TransportError::System {
            context: context.into(),
            source: Some(source),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    /// True when the failure left (or found) the transport without a live connection.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            TransportError::Io { .. } | TransportError::UnexpectedClose | TransportError::NotConnected
        )
    }
}
