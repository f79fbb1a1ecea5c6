//! halflink-test-harness: Mock backends and endpoints for halflink.
//!
//! This crate provides [`MockBackend`] for deterministic unit testing of
//! the mode controller and radio stack without real signal-processing
//! pipelines or TCP peers. It implements both backend seams
//! ([`DataPathFactory`](halflink_core::DataPathFactory) and
//! [`EndpointConnector`](halflink_core::EndpointConnector)) and records
//! every path lifecycle transition and every sent frame for assertions.

pub mod backend;

pub use backend::{MockBackend, MockFrameSink, MockFrameSource, PathKind, PathStatus, SentFrame};
