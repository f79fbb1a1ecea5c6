//! Error types for halflink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! data-path errors are all captured here.
//!
//! Note that frame-integrity failures (checksum mismatch, keep-alive filler)
//! are *not* errors: they are routine on a lossy RF link and surface as an
//! empty receive result instead.

/// The error type for all halflink operations.
///
/// Variants cover the failure modes of a half-duplex link controller:
/// transport failures, framing violations, timeouts, data-path lifecycle
/// failures, and misuse of an endpoint that is not bound.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (TCP socket setup or teardown).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed message framing on the wire).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a connection to be established.
    ///
    /// This typically indicates the signal-processing peer is not running
    /// or the transport address is wrong.
    #[error("timeout waiting for peer")]
    Timeout,

    /// A data path failed to start or stop.
    #[error("data path error: {0}")]
    DataPath(String),

    /// An invalid parameter was passed to the stack or builder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No endpoint is bound for the requested direction.
    ///
    /// Returned when sending while not in transmit mode, or receiving
    /// while not in receive mode.
    #[error("not connected")]
    NotConnected,

    /// The connection to the signal-processing peer was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("connection refused".into());
        assert_eq!(e.to_string(), "transport error: connection refused");
    }

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("oversized frame".into());
        assert_eq!(e.to_string(), "protocol error: oversized frame");
    }

    #[test]
    fn error_display_timeout() {
        let e = Error::Timeout;
        assert_eq!(e.to_string(), "timeout waiting for peer");
    }

    #[test]
    fn error_display_data_path() {
        let e = Error::DataPath("pipeline refused to start".into());
        assert_eq!(e.to_string(), "data path error: pipeline refused to start");
    }

    #[test]
    fn error_display_not_connected() {
        let e = Error::NotConnected;
        assert_eq!(e.to_string(), "not connected");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }
}
