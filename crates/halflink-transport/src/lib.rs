//! halflink-transport: TCP frame endpoint implementations.
//!
//! Implements the [`FrameSink`](halflink_core::FrameSink) /
//! [`FrameSource`](halflink_core::FrameSource) contracts over
//! `tokio::net::TcpStream`, with 4-byte length-prefixed message framing so
//! that each send arrives as one whole message regardless of how TCP
//! segments it.

pub mod tcp;

pub use tcp::{TcpConnector, TcpFrameSink, TcpFrameStream};
