//! halflink-stack: the link control layer.
//!
//! This crate holds the three genuinely stateful pieces of the system and
//! the composition root that ties them together:
//!
//! - [`frame`] -- frame encoding, the arithmetic checksum, and the
//!   silent-drop decode policy for a lossy RF link
//! - [`guard`] -- the bounded-time receive that keeps the host from
//!   hanging on an unresponsive peer
//! - [`controller`] -- the mode-switching state machine guaranteeing at
//!   most one active radio-facing data path
//! - [`stack`] -- [`RadioStack`], the caller-facing composition of all of
//!   the above plus configuration bookkeeping

pub mod controller;
pub mod frame;
pub mod guard;
pub mod stack;

pub use controller::ModeController;
pub use stack::{RadioStack, RadioStackBuilder};
