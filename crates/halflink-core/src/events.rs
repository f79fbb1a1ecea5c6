//! Asynchronous link event types.
//!
//! Events are emitted by the stack through a `tokio::sync::broadcast`
//! channel when the link's state changes. Monitoring tools subscribe to
//! these for real-time visibility without polling.

use crate::types::Mode;

/// Why a received frame was dropped instead of delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The trailing checksum byte did not match the payload.
    ChecksumMismatch,
    /// The payload was the reserved keep-alive filler.
    KeepAlive,
    /// The frame was too short to carry a checksum.
    Truncated,
}

/// An event emitted by the stack when link state changes.
///
/// Events are delivered on a best-effort basis through a bounded broadcast
/// channel; slow consumers may miss events under load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The operating mode changed after a successful switch.
    ModeChanged {
        /// The new mode.
        mode: Mode,
    },

    /// A received frame was filtered out before delivery.
    ///
    /// Dropped frames are routine on a lossy RF link; this event exists for
    /// link-quality monitoring, not error handling.
    FrameDropped {
        /// Why the frame was dropped.
        reason: DropReason,
    },

    /// The link was shut down and both endpoints released.
    ShutDown,
}
