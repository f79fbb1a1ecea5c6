//! TCP frame endpoints.
//!
//! The signal-processing pipelines expose TCP sockets: the transmit
//! pipeline listens for payload bytes to modulate, the receive pipeline
//! serves demodulated bytes. These endpoints connect out to those sockets
//! and exchange length-prefixed messages so that one `send_framed` on this
//! side arrives as exactly one `poll_frame` on the other, preserving the
//! message boundaries the link protocol depends on.
//!
//! # Wire format
//!
//! ```text
//! <len: u32 big-endian> <len bytes>
//! ```
//!
//! Outbound, the message bytes are `preamble ++ payload ++ checksum`.
//! Inbound, the receive pipeline has already stripped the preamble, so a
//! polled message is `payload ++ checksum` only.

use async_trait::async_trait;
use bytes::{Buf, BufMut, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use halflink_core::endpoint::{EndpointConnector, FrameSink, FrameSource};
use halflink_core::error::{Error, Result};

/// Default connection timeout (5 seconds).
///
/// Generous enough for a pipeline that is still binding its socket, short
/// enough that a mode switch against a dead peer fails promptly.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single message's length prefix.
///
/// A prefix beyond this is treated as stream corruption rather than a
/// genuine frame; link payloads are command-sized, not bulk transfers.
const MAX_FRAME_LEN: usize = 64 * 1024;

/// Outbound TCP endpoint feeding a transmit pipeline.
///
/// Implements [`FrameSink`]. The connection is established eagerly via
/// [`connect`](TcpFrameSink::connect); `None` after `close()`.
#[derive(Debug)]
pub struct TcpFrameSink {
    /// The underlying TCP stream, `None` after `close()` is called.
    stream: Option<TcpStream>,
    /// The address string for logging/debugging.
    addr: String,
}

impl TcpFrameSink {
    /// Connect to a transmit pipeline using the default timeout.
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Connect to a transmit pipeline with a specified timeout.
    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = connect_stream(addr, timeout).await?;
        Ok(Self {
            stream: Some(stream),
            addr: addr.to_string(),
        })
    }

    /// Wrap an existing `TcpStream` as a `TcpFrameSink`.
    ///
    /// Useful when a connection has already been established externally
    /// (e.g. accepted from a listener in tests).
    pub fn from_stream(stream: TcpStream, addr: String) -> Self {
        Self {
            stream: Some(stream),
            addr,
        }
    }

    /// Get the address string this endpoint was connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl FrameSink for TcpFrameSink {
    async fn send_framed(&mut self, preamble: &[u8], body: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let len = preamble.len() + body.len();
        if len > MAX_FRAME_LEN {
            return Err(Error::Protocol(format!(
                "frame length {len} exceeds {MAX_FRAME_LEN}"
            )));
        }

        // One buffered write per frame keeps the message atomic on the wire.
        let mut msg = BytesMut::with_capacity(4 + len);
        msg.put_u32(len as u32);
        msg.put_slice(preamble);
        msg.put_slice(body);

        tracing::trace!(
            addr = %self.addr,
            preamble_len = preamble.len(),
            body_len = body.len(),
            "sending frame"
        );

        stream.write_all(&msg).await.map_err(|e| {
            tracing::error!(addr = %self.addr, error = %e, "failed to send frame");
            map_io_error(e)
        })?;
        stream.flush().await.map_err(|e| {
            tracing::error!(addr = %self.addr, error = %e, "failed to flush frame");
            map_io_error(e)
        })?;

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!(addr = %self.addr, "closing outbound endpoint");

            if let Err(e) = stream.flush().await {
                tracing::warn!(
                    addr = %self.addr,
                    error = %e,
                    "failed to flush before closing (continuing anyway)"
                );
            }
            if let Err(e) = stream.shutdown().await {
                tracing::warn!(
                    addr = %self.addr,
                    error = %e,
                    "failed to shutdown TCP stream (continuing anyway)"
                );
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Inbound TCP endpoint draining a receive pipeline.
///
/// Implements [`FrameSource`]. Reassembly state lives in `self`, so a
/// `poll_frame` future abandoned by a timeout race leaves any partially
/// received message in the buffer for the next poll -- cancellation never
/// loses bytes.
#[derive(Debug)]
pub struct TcpFrameStream {
    /// The underlying TCP stream, `None` after `close()` is called.
    stream: Option<TcpStream>,
    /// Reassembly buffer for partially received messages.
    buf: BytesMut,
    /// The address string for logging/debugging.
    addr: String,
}

impl TcpFrameStream {
    /// Connect to a receive pipeline using the default timeout.
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Connect to a receive pipeline with a specified timeout.
    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = connect_stream(addr, timeout).await?;
        Ok(Self {
            stream: Some(stream),
            buf: BytesMut::with_capacity(4096),
            addr: addr.to_string(),
        })
    }

    /// Wrap an existing `TcpStream` as a `TcpFrameStream`.
    pub fn from_stream(stream: TcpStream, addr: String) -> Self {
        Self {
            stream: Some(stream),
            buf: BytesMut::with_capacity(4096),
            addr,
        }
    }

    /// Get the address string this endpoint was connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Try to extract one complete message from the reassembly buffer.
    fn extract_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len =
            u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(Error::Protocol(format!(
                "frame length {len} exceeds {MAX_FRAME_LEN}"
            )));
        }
        if self.buf.len() < 4 + len {
            return Ok(None);
        }
        self.buf.advance(4);
        let frame = self.buf.split_to(len).to_vec();
        Ok(Some(frame))
    }
}

#[async_trait]
impl FrameSource for TcpFrameStream {
    async fn poll_frame(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(frame) = self.extract_frame()? {
                tracing::trace!(
                    addr = %self.addr,
                    bytes = frame.len(),
                    "frame received"
                );
                return Ok(frame);
            }

            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
            // read_buf is cancel-safe: bytes land in self.buf or not at all,
            // so a deadline race cannot tear a message.
            let n = stream.read_buf(&mut self.buf).await.map_err(|e| {
                tracing::error!(addr = %self.addr, error = %e, "failed to receive");
                map_io_error(e)
            })?;
            if n == 0 {
                tracing::warn!(addr = %self.addr, "peer closed connection");
                return Err(Error::ConnectionLost);
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!(addr = %self.addr, "closing inbound endpoint");
            if let Err(e) = stream.shutdown().await {
                tracing::warn!(
                    addr = %self.addr,
                    error = %e,
                    "failed to shutdown TCP stream (continuing anyway)"
                );
            }
        }
        self.buf.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// [`EndpointConnector`] creating TCP endpoints.
///
/// This is the production connector; the mode controller calls it on every
/// switch so each mode gets freshly bound endpoints.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    /// Create a connector using the default connect timeout.
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Create a connector with a specified connect timeout.
    pub fn with_connect_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointConnector for TcpConnector {
    async fn connect_sink(&self, addr: &str) -> Result<Box<dyn FrameSink>> {
        let sink = TcpFrameSink::connect_with_timeout(addr, self.connect_timeout).await?;
        Ok(Box::new(sink))
    }

    async fn connect_source(&self, addr: &str) -> Result<Box<dyn FrameSource>> {
        let source = TcpFrameStream::connect_with_timeout(addr, self.connect_timeout).await?;
        Ok(Box::new(source))
    }
}

/// Establish a TCP connection with timeout and low-latency options applied.
async fn connect_stream(addr: &str, timeout: Duration) -> Result<TcpStream> {
    tracing::debug!(
        addr = %addr,
        timeout_ms = timeout.as_millis(),
        "connecting to pipeline endpoint"
    );

    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| {
            tracing::error!(addr = %addr, "TCP connection timed out");
            Error::Timeout
        })?
        .map_err(|e| {
            tracing::error!(addr = %addr, error = %e, "TCP connection failed");
            map_connect_error(e, addr)
        })?;

    // Frames are small and latency-sensitive; disable Nagle.
    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(
            addr = %addr,
            error = %e,
            "failed to set TCP_NODELAY (continuing anyway)"
        );
    }

    tracing::info!(addr = %addr, "endpoint connected");
    Ok(stream)
}

/// Map a connection-time I/O error to the appropriate [`Error`] variant.
fn map_connect_error(e: std::io::Error, addr: &str) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => {
            Error::Transport(format!("connection refused: {}", addr))
        }
        _ => Error::Io(e),
    }
}

/// Map a data-path I/O error to the appropriate [`Error`] variant.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::ConnectionAborted => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Helper: bind a TcpListener on a random available port and return it
    /// along with its address string.
    async fn test_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    /// Helper: read one length-prefixed message from a raw stream.
    async fn read_message(stream: &mut TcpStream) -> Vec<u8> {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut msg = vec![0u8; len];
        stream.read_exact(&mut msg).await.unwrap();
        msg
    }

    /// Helper: write one length-prefixed message to a raw stream.
    async fn write_message(stream: &mut TcpStream, msg: &[u8]) {
        stream
            .write_all(&(msg.len() as u32).to_be_bytes())
            .await
            .unwrap();
        stream.write_all(msg).await.unwrap();
        stream.flush().await.unwrap();
    }

    #[tokio::test]
    async fn sink_sends_preamble_and_body_as_one_message() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_message(&mut stream).await
        });

        let mut sink = TcpFrameSink::connect(&addr).await.unwrap();
        assert!(sink.is_connected());

        sink.send_framed(&[0xAA], &[1, 2, 3, 6]).await.unwrap();

        let msg = server.await.unwrap();
        assert_eq!(msg, vec![0xAA, 1, 2, 3, 6]);

        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn sink_send_after_close_returns_not_connected() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut sink = TcpFrameSink::connect(&addr).await.unwrap();
        sink.close().await.unwrap();
        assert!(!sink.is_connected());

        let result = sink.send_framed(&[0xAA], &[1]).await;
        assert!(matches!(result, Err(Error::NotConnected)));

        server.abort();
    }

    #[tokio::test]
    async fn sink_rejects_oversized_frame() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut sink = TcpFrameSink::connect(&addr).await.unwrap();
        let body = vec![0u8; MAX_FRAME_LEN + 1];
        let result = sink.send_framed(&[], &body).await;
        assert!(matches!(result, Err(Error::Protocol(_))));

        sink.close().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn stream_receives_one_message() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            write_message(&mut stream, &[1, 2, 3, 6]).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut source = TcpFrameStream::connect(&addr).await.unwrap();
        let frame = source.poll_frame().await.unwrap();
        assert_eq!(frame, vec![1, 2, 3, 6]);

        source.close().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn stream_reassembles_split_delivery() {
        let (listener, addr) = test_listener().await;

        // Server dribbles the message out in three writes.
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let msg: &[u8] = &[1, 2, 3, 6];
            let mut wire = (msg.len() as u32).to_be_bytes().to_vec();
            wire.extend_from_slice(msg);

            for chunk in wire.chunks(3) {
                stream.write_all(chunk).await.unwrap();
                stream.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut source = TcpFrameStream::connect(&addr).await.unwrap();
        let frame = source.poll_frame().await.unwrap();
        assert_eq!(frame, vec![1, 2, 3, 6]);

        source.close().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn stream_returns_messages_in_order() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            write_message(&mut stream, b"first").await;
            write_message(&mut stream, b"second").await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut source = TcpFrameStream::connect(&addr).await.unwrap();
        assert_eq!(source.poll_frame().await.unwrap(), b"first");
        assert_eq!(source.poll_frame().await.unwrap(), b"second");

        source.close().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn stream_detects_peer_close() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut source = TcpFrameStream::connect(&addr).await.unwrap();
        server.await.unwrap();

        let result = source.poll_frame().await;
        assert!(
            matches!(result, Err(Error::ConnectionLost)),
            "expected ConnectionLost, got: {:?}",
            result
        );
    }

    #[tokio::test]
    async fn stream_rejects_corrupt_length_prefix() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Length prefix far beyond the frame cap.
            stream
                .write_all(&u32::MAX.to_be_bytes())
                .await
                .unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut source = TcpFrameStream::connect(&addr).await.unwrap();
        let result = source.poll_frame().await;
        assert!(matches!(result, Err(Error::Protocol(_))));

        server.abort();
    }

    #[tokio::test]
    async fn abandoned_poll_does_not_corrupt_next_receive() {
        let (listener, addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Quiet period first, then a message.
            tokio::time::sleep(Duration::from_millis(200)).await;
            write_message(&mut stream, &[9, 8, 7]).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut source = TcpFrameStream::connect(&addr).await.unwrap();

        // Race a poll against a short deadline; it expires while the peer
        // is silent.
        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), source.poll_frame()).await;
        assert!(timed_out.is_err());

        // The endpoint is still usable and delivers the message whole.
        let frame = source.poll_frame().await.unwrap();
        assert_eq!(frame, vec![9, 8, 7]);

        source.close().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn connector_creates_working_endpoints() {
        let (sink_listener, sink_addr) = test_listener().await;
        let (source_listener, source_addr) = test_listener().await;

        let server = tokio::spawn(async move {
            let (mut tx_conn, _) = sink_listener.accept().await.unwrap();
            let (mut rx_conn, _) = source_listener.accept().await.unwrap();
            // Echo the message body from the sink side to the source side.
            let msg = read_message(&mut tx_conn).await;
            write_message(&mut rx_conn, &msg).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let connector = TcpConnector::new();
        let mut sink = connector.connect_sink(&sink_addr).await.unwrap();
        let mut source = connector.connect_source(&source_addr).await.unwrap();

        sink.send_framed(&[0xAA], &[5, 5, 10]).await.unwrap();
        let frame = source.poll_frame().await.unwrap();
        assert_eq!(frame, vec![0xAA, 5, 5, 10]);

        sink.close().await.unwrap();
        source.close().await.unwrap();
        server.abort();
    }

    #[tokio::test]
    async fn connect_refused() {
        // Bind a listener and immediately drop it so the port is not listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = TcpFrameSink::connect(&addr).await;
        assert!(result.is_err());
        match result.unwrap_err() {
            Error::Transport(msg) => assert!(
                msg.contains("connection refused"),
                "expected 'connection refused' in message, got: {}",
                msg
            ),
            other => panic!("expected Transport error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn connect_timeout_to_blackholed_host() {
        // RFC 5737: 192.0.2.0/24 is TEST-NET-1, reserved for documentation.
        // Connections to it should time out (packets are black-holed).
        let result =
            TcpFrameStream::connect_with_timeout("192.0.2.1:12345", Duration::from_millis(100))
                .await;

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(
            matches!(err, Error::Timeout | Error::Io(_)),
            "expected Timeout or Io, got: {:?}",
            err
        );
    }
}
