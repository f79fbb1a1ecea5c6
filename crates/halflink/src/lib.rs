//! # halflink -- Half-Duplex Link Control for a Shared Radio
//!
//! `halflink` is an asynchronous Rust library that arbitrates a single
//! shared radio between two mutually-exclusive operating modes -- receive
//! and transmit -- and exchanges framed, checksummed byte sequences with a
//! signal-processing subsystem over TCP. It is used symmetrically by two
//! peer radios (a host and a remote unit) that must stay
//! configuration-synchronized.
//!
//! ## Quick Start
//!
//! Add `halflink` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! halflink = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Bring up a link and exchange a command:
//!
//! ```no_run
//! use halflink::{
//!     BasebandConfig, Modulation, RadioStackBuilder, RfConfig, SdrSelector,
//!     TransportAddresses,
//! };
//! # use halflink::DataPathFactory;
//!
//! # async fn example(factory: Box<dyn DataPathFactory>) -> halflink::Result<()> {
//! let rf = RfConfig {
//!     center_freq_hz: 433_920_000,
//!     samp_rate_hz: 1_000_000,
//!     gain_db: 20,
//!     channel: 0,
//! };
//! let bb = BasebandConfig {
//!     modulation: Modulation::Gfsk,
//!     symbol_rate: 9_600,
//!     preamble: vec![0xAA],
//! };
//! let addrs = TransportAddresses {
//!     tx_addr: "127.0.0.1:52001".into(),
//!     rx_addr: "127.0.0.1:52002".into(),
//! };
//!
//! let mut stack = RadioStackBuilder::new(rf.clone(), bb.clone(), rf, bb, addrs)
//!     .sdr(SdrSelector::Test)
//!     .build(factory)?;
//!
//! // Tell the peer how to reach us, then listen for its answer.
//! stack.switch_to_tx().await?;
//! stack.send_uplink_config().await?;
//! stack.switch_to_rx().await?;
//! let reply = stack.recv_bytes_timeout(None).await?;
//! println!("peer answered with {} bytes", reply.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                   | Purpose                                          |
//! |-------------------------|--------------------------------------------------|
//! | `halflink-core`         | Traits ([`DataPath`], [`FrameSink`]), types, errors |
//! | `halflink-transport`    | TCP frame endpoint implementations               |
//! | `halflink-stack`        | Frame codec, mode controller, [`RadioStack`]     |
//! | `halflink-test-harness` | Mock backend for deterministic testing           |
//! | **`halflink`**          | This facade crate -- re-exports everything       |
//!
//! ## The mode guarantee
//!
//! The receive path and the transmit path contend for the same physical
//! radio, so at most one is ever active. Every switch tears down the old
//! path in order (stop, settle, release endpoint) before the new one comes
//! up, and a failed switch rolls back to [`Mode::Idle`] with nothing bound.
//!
//! ## Receive semantics
//!
//! Frames that fail the checksum or carry the keep-alive filler are
//! silently dropped -- routine on a lossy RF link, never an error. The host
//! side uses the guarded receives
//! ([`recv_bytes_timeout`](RadioStack::recv_bytes_timeout)) so it can never
//! hang on an unresponsive peer; the remote unit blocks on the unguarded
//! [`recv_bytes`](RadioStack::recv_bytes) because another command from the
//! host always eventually arrives.

pub use halflink_core::*;

pub use halflink_stack::{ModeController, RadioStack, RadioStackBuilder};

/// Frame encoding, checksum, and decode policy.
pub mod frame {
    pub use halflink_stack::frame::*;
}

/// Bounded-time receive helpers.
pub mod guard {
    pub use halflink_stack::guard::*;
}

/// TCP frame endpoint implementations.
pub mod transport {
    pub use halflink_transport::*;
}
