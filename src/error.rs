//! Error types
//!
//! Every way a session can end is reported through [`Error`]. Most of them
//! are ordinary, expected outcomes that the supervisor retries; see
//! [`Error::is_graceful_stop`].

use std::time::Duration;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by the transport client when dialing a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Dial did not finish within the configured timeout
    Timeout(Duration),
    /// A socket operation timed out inside the transport
    TimedOut(String),
    /// Network-level connect failure
    Connect(String),
    /// Source rejected our credentials
    Unauthorized,
    /// Source answered with something we could not understand
    Protocol(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout(after) => write!(f, "dial timed out after {:?}", after),
            TransportError::TimedOut(msg) => write!(f, "timed out: {}", msg),
            TransportError::Connect(msg) => write!(f, "connect failed: {}", msg),
            TransportError::Unauthorized => write!(f, "unauthorized"),
            TransportError::Protocol(msg) => write!(f, "protocol error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => TransportError::TimedOut(err.to_string()),
            _ => TransportError::Connect(err.to_string()),
        }
    }
}

/// Reason a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Connection to the source could not be established
    Dial(TransportError),
    /// No keyframe (or audio packet, for audio-only sources) within the keyframe timeout
    NoVideoOnStream,
    /// Transport signalled that the remote stream stopped
    RtspDisconnect,
    /// On-demand stream has nobody watching
    NoViewer,
    /// Stream name is not registered
    StreamNotFound(String),
}

impl Error {
    /// True for the one exit that stops the supervisor instead of retrying
    pub fn is_graceful_stop(&self) -> bool {
        matches!(self, Error::NoViewer)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Dial(e) => write!(f, "{}", e),
            Error::NoVideoOnStream => write!(f, "Stream Exit No Video On Stream"),
            Error::RtspDisconnect => write!(f, "Stream Exit Rtsp Disconnect"),
            Error::NoViewer => write!(f, "Stream Exit On Demand No Viewer"),
            Error::StreamNotFound(name) => write!(f, "Stream not found: {}", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Dial(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Dial(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_error_passthrough() {
        let err: Error = TransportError::Connect("connection refused".into()).into();

        // The transport message is shown as-is, not wrapped
        assert_eq!(err.to_string(), "connect failed: connection refused");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_graceful_stop() {
        assert!(Error::NoViewer.is_graceful_stop());
        assert!(!Error::NoVideoOnStream.is_graceful_stop());
        assert!(!Error::RtspDisconnect.is_graceful_stop());
        assert!(!Error::Dial(TransportError::Unauthorized).is_graceful_stop());
    }

    #[test]
    fn test_io_error_conversion() {
        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let err = TransportError::from(timed_out);
        assert_eq!(err, TransportError::TimedOut("slow".into()));
        assert_eq!(err.to_string(), "timed out: slow");

        let err = TransportError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "dial timed out after 10s");

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "nope");
        assert!(matches!(
            TransportError::from(refused),
            TransportError::Connect(_)
        ));
    }
}
