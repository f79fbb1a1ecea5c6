//! halflink-core: Core traits, types, and error definitions for halflink.
//!
//! This crate defines the backend-agnostic abstractions that the link
//! controller builds on. Applications depend on these types without pulling
//! in any concrete transport or signal-processing backend.
//!
//! # Key types
//!
//! - [`DataPath`] / [`DataPathFactory`] -- the signal-processing pipeline contract
//! - [`FrameSink`] / [`FrameSource`] -- directional byte-transport endpoints
//! - [`EndpointConnector`] -- binds endpoints to transport addresses
//! - [`Mode`] -- the exclusive operating state of the shared radio
//! - [`LinkEvent`] -- asynchronous state change notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod datapath;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod types;

// Re-export key types at crate root for ergonomic `use halflink_core::*`.
pub use datapath::{DataPath, DataPathFactory, NullDataPath};
pub use endpoint::{EndpointConnector, FrameSink, FrameSource};
pub use error::{Error, Result};
pub use events::{DropReason, LinkEvent};
pub use types::*;
