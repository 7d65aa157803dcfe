// Core types shared by every nutsock component
use std::fmt;
use std::time::Duration;

/// How long a single connect wait, read or write may block.
///
/// Applies to each call on its own; it is not a deadline shared across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeout {
    /// Block until the operation can proceed.
    #[default]
    Infinite,
    /// Give up once the duration elapses without readiness.
    After(Duration),
}

impl Timeout {
    /// Build from whole seconds; any negative value means "block indefinitely".
    pub fn from_secs(secs: i64) -> Self {
        if secs < 0 {
            Timeout::Infinite
        } else {
            Timeout::After(Duration::from_secs(secs as u64))
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Timeout::After(Duration::from_millis(millis))
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Timeout::After(_))
    }

    /// The bound as a duration, `None` when infinite.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Timeout::Infinite => None,
            Timeout::After(d) => Some(*d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::After(d)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Timeout::Infinite, Timeout::After)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Timeout::Infinite => write!(f, "infinite"),
            Timeout::After(d) => write!(f, "{}ms", d.as_millis()),
        }
    }
}

// Lifecycle of a transport instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "DISCONNECTED"),
            ConnectionState::Connecting => write!(f, "CONNECTING"),
            ConnectionState::Connected => write!(f, "CONNECTED"),
        }
    }
}

// Operation that failed or timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Connect,
    Read,
    Write,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IoOp::Connect => write!(f, "connect"),
            IoOp::Read => write!(f, "read"),
            IoOp::Write => write!(f, "write"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_seconds_mean_infinite() {
        assert_eq!(Timeout::from_secs(-1), Timeout::Infinite);
        assert_eq!(Timeout::from_secs(-42), Timeout::Infinite);
        assert!(!Timeout::from_secs(-1).is_finite());
    }

    #[test]
    fn zero_is_a_finite_timeout() {
        let t = Timeout::from_secs(0);
        assert!(t.is_finite());
        assert_eq!(t.duration(), Some(Duration::ZERO));
    }

    #[test]
    fn default_blocks_indefinitely() {
        assert_eq!(Timeout::default(), Timeout::Infinite);
        assert_eq!(Timeout::default().duration(), None);
    }

    #[test]
    fn optional_duration_conversion() {
        assert_eq!(Timeout::from(None), Timeout::Infinite);
        assert_eq!(
            Timeout::from(Some(Duration::from_millis(250))),
            Timeout::from_millis(250)
        );
    }

    #[test]
    fn display() {
        assert_eq!(Timeout::from_millis(1500).to_string(), "1500ms");
        assert_eq!(Timeout::Infinite.to_string(), "infinite");
        assert_eq!(ConnectionState::Connected.to_string(), "CONNECTED");
        assert_eq!(IoOp::Read.to_string(), "read");
    }
}
