//! Frame endpoint traits -- directional byte transport to the data paths.
//!
//! The transmit pipeline consumes whole framed messages; the receive
//! pipeline produces them. The two directions are bound independently (one
//! per mode, never both), so the contract is split into [`FrameSink`] and
//! [`FrameSource`] rather than a single bidirectional transport.
//!
//! Concrete implementations exist for TCP (`halflink-transport`) and for
//! deterministic testing (`halflink-test-harness`).

use async_trait::async_trait;

use crate::error::Result;

/// Outbound endpoint feeding the transmit pipeline.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Send one frame: `preamble ++ body` as a single message.
    ///
    /// `body` is the checksummed payload produced by the frame codec; the
    /// preamble comes from the active baseband configuration. Implementations
    /// must deliver the frame whole or fail -- never a partial frame.
    async fn send_framed(&mut self, preamble: &[u8], body: &[u8]) -> Result<()>;

    /// Close the endpoint.
    ///
    /// After `close()`, `send_framed()` returns [`Error::NotConnected`](crate::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the endpoint is currently connected.
    fn is_connected(&self) -> bool;
}

/// Inbound endpoint draining the receive pipeline.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Block until one complete message arrives and return its bytes.
    ///
    /// The receive pipeline strips the preamble during demodulation, so the
    /// returned bytes are `payload ++ checksum` only.
    ///
    /// Implementations must be cancel-safe: a caller may race this future
    /// against a deadline, and an abandoned poll must not lose or corrupt
    /// the frame a later poll would return.
    async fn poll_frame(&mut self) -> Result<Vec<u8>>;

    /// Close the endpoint.
    async fn close(&mut self) -> Result<()>;

    /// Check whether the endpoint is currently connected.
    fn is_connected(&self) -> bool;
}

/// Binds frame endpoints to transport addresses.
///
/// The mode controller calls this on every switch, so each mode gets fresh
/// endpoints and a torn-down mode leaves nothing bound.
#[async_trait]
pub trait EndpointConnector: Send + Sync {
    /// Connect an outbound endpoint to the transmit pipeline at `addr`.
    async fn connect_sink(&self, addr: &str) -> Result<Box<dyn FrameSink>>;

    /// Connect an inbound endpoint to the receive pipeline at `addr`.
    async fn connect_source(&self, addr: &str) -> Result<Box<dyn FrameSource>>;
}
