//! RadioStack -- the caller-facing composition root.
//!
//! Holds the configuration for both link directions, delegates mode changes
//! to the [`ModeController`], byte exchange to the [`frame`](crate::frame)
//! codec, and bounded receives to the [`guard`](crate::guard). Used
//! symmetrically by the host and the remote unit; the host calls the
//! guarded receive variants, the remote unit the unguarded ones.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, trace};

use halflink_core::datapath::DataPathFactory;
use halflink_core::endpoint::EndpointConnector;
use halflink_core::error::{Error, Result};
use halflink_core::events::{DropReason, LinkEvent};
use halflink_core::types::{BasebandConfig, Mode, RfConfig, SdrSelector, TransportAddresses};

use crate::controller::ModeController;
use crate::frame::{self, FrameOutcome};
use crate::guard::{self, recv_guarded};

/// Broadcast channel capacity for [`LinkEvent`] subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fluent builder for [`RadioStack`].
///
/// Configuration for both directions is required up front; timeouts, the
/// settle delay, and the SDR selection have defaults.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use halflink_core::{BasebandConfig, Modulation, RfConfig, SdrSelector, TransportAddresses};
/// use halflink_stack::RadioStackBuilder;
/// use halflink_transport::TcpConnector;
/// # use halflink_core::{DataPathFactory, Result};
/// # async fn example(factory: Box<dyn DataPathFactory>) -> Result<()> {
/// let rf = RfConfig { center_freq_hz: 433_920_000, samp_rate_hz: 1_000_000, gain_db: 20, channel: 0 };
/// let bb = BasebandConfig { modulation: Modulation::Gfsk, symbol_rate: 9_600, preamble: vec![0xAA] };
/// let addrs = TransportAddresses {
///     tx_addr: "127.0.0.1:52001".into(),
///     rx_addr: "127.0.0.1:52002".into(),
/// };
///
/// let mut stack = RadioStackBuilder::new(rf.clone(), bb.clone(), rf, bb, addrs)
///     .sdr(SdrSelector::Test)
///     .recv_timeout(Duration::from_secs(5))
///     .build_with_backend(factory, Box::new(TcpConnector::new()))?;
///
/// stack.switch_to_tx().await?;
/// stack.send_str("hello").await?;
/// # Ok(())
/// # }
/// ```
pub struct RadioStackBuilder {
    rx_rf: RfConfig,
    rx_bb: BasebandConfig,
    tx_rf: RfConfig,
    tx_bb: BasebandConfig,
    addrs: TransportAddresses,
    sdr: SdrSelector,
    settle_delay: Duration,
    recv_timeout: Duration,
    text_timeout: Duration,
}

impl RadioStackBuilder {
    /// Create a builder from the four per-direction configurations and the
    /// transport addresses.
    pub fn new(
        rx_rf: RfConfig,
        rx_bb: BasebandConfig,
        tx_rf: RfConfig,
        tx_bb: BasebandConfig,
        addrs: TransportAddresses,
    ) -> Self {
        Self {
            rx_rf,
            rx_bb,
            tx_rf,
            tx_bb,
            addrs,
            sdr: SdrSelector::Test,
            settle_delay: crate::controller::DEFAULT_SETTLE_DELAY,
            recv_timeout: guard::DEFAULT_RECV_TIMEOUT,
            text_timeout: guard::DEFAULT_TEXT_TIMEOUT,
        }
    }

    /// Select the SDR hardware (default: [`SdrSelector::Test`]).
    ///
    /// Fixed for the life of the stack.
    pub fn sdr(mut self, sdr: SdrSelector) -> Self {
        self.sdr = sdr;
        self
    }

    /// Override the settle delay applied after stopping a data path
    /// (default: 1 second).
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Override the default deadline for byte-level guarded receives
    /// (default: 10 seconds).
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Override the default deadline for text-level guarded receives
    /// (default: 2 seconds).
    pub fn text_timeout(mut self, timeout: Duration) -> Self {
        self.text_timeout = timeout;
        self
    }

    /// Build a [`RadioStack`] with caller-provided backend seams.
    ///
    /// This is the primary entry point for testing (pass a `MockBackend`
    /// from `halflink-test-harness`) and for wiring real data-path
    /// factories.
    pub fn build_with_backend(
        self,
        factory: Box<dyn DataPathFactory>,
        connector: Box<dyn EndpointConnector>,
    ) -> Result<RadioStack> {
        for (label, bb) in [("rx", &self.rx_bb), ("tx", &self.tx_bb)] {
            if bb.preamble.is_empty() {
                return Err(Error::InvalidParameter(format!(
                    "{label} baseband preamble must not be empty"
                )));
            }
            if bb.preamble.len() > u8::MAX as usize {
                return Err(Error::InvalidParameter(format!(
                    "{label} baseband preamble exceeds 255 bytes"
                )));
            }
        }

        let mut controller = ModeController::new(factory, connector);
        controller.set_settle_delay(self.settle_delay);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(RadioStack {
            rx_rf: self.rx_rf,
            rx_bb: self.rx_bb,
            tx_rf: self.tx_rf,
            tx_bb: self.tx_bb,
            addrs: self.addrs,
            sdr: self.sdr,
            controller,
            recv_timeout: self.recv_timeout,
            text_timeout: self.text_timeout,
            event_tx,
        })
    }

    /// Build a [`RadioStack`] using TCP endpoints.
    ///
    /// Convenience wrapper around
    /// [`build_with_backend`](Self::build_with_backend) with a
    /// [`TcpConnector`](halflink_transport::TcpConnector).
    pub fn build(self, factory: Box<dyn DataPathFactory>) -> Result<RadioStack> {
        self.build_with_backend(factory, Box::new(halflink_transport::TcpConnector::new()))
    }
}

/// Configurable radio stack for one end of a half-duplex link.
///
/// All operations take `&mut self`: one logical thread of control per
/// instance, no reentrant mode switches.
pub struct RadioStack {
    rx_rf: RfConfig,
    rx_bb: BasebandConfig,
    tx_rf: RfConfig,
    tx_bb: BasebandConfig,
    addrs: TransportAddresses,
    sdr: SdrSelector,
    controller: ModeController,
    recv_timeout: Duration,
    text_timeout: Duration,
    event_tx: broadcast::Sender<LinkEvent>,
}

impl RadioStack {
    /// The current operating mode.
    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    /// Subscribe to link events.
    ///
    /// Returns a broadcast receiver. The channel is bounded; if the
    /// consumer falls behind, older events will be dropped (lagged).
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.event_tx.subscribe()
    }

    /// Switch to receive mode using a snapshot of the current receive
    /// configuration.
    pub async fn switch_to_rx(&mut self) -> Result<()> {
        let rf = self.rx_rf.clone();
        let bb = self.rx_bb.clone();
        self.controller
            .switch_to_receive(self.sdr, &rf, &bb, &self.addrs.rx_addr)
            .await?;
        let _ = self.event_tx.send(LinkEvent::ModeChanged {
            mode: Mode::Receiving,
        });
        Ok(())
    }

    /// Switch to transmit mode using a snapshot of the current transmit
    /// configuration.
    pub async fn switch_to_tx(&mut self) -> Result<()> {
        let rf = self.tx_rf.clone();
        let bb = self.tx_bb.clone();
        self.controller
            .switch_to_transmit(self.sdr, &rf, &bb, &self.addrs.tx_addr)
            .await?;
        let _ = self.event_tx.send(LinkEvent::ModeChanged {
            mode: Mode::Transmitting,
        });
        Ok(())
    }

    /// Stop the active data path (if any) and release both endpoints.
    ///
    /// Safe to call repeatedly and when already idle.
    pub async fn shutdown(&mut self) {
        let was_active = self.controller.mode() != Mode::Idle;
        self.controller.shutdown().await;
        if was_active {
            let _ = self.event_tx.send(LinkEvent::ShutDown);
        }
    }

    /// Replace the receive configuration.
    ///
    /// Takes effect on the next [`switch_to_rx`](Self::switch_to_rx); the
    /// running mode is unaffected.
    pub fn set_rx_config(&mut self, rf: RfConfig, bb: BasebandConfig) {
        self.rx_rf = rf;
        self.rx_bb = bb;
    }

    /// Replace the transmit configuration.
    ///
    /// Takes effect on the next [`switch_to_tx`](Self::switch_to_tx).
    pub fn set_tx_config(&mut self, rf: RfConfig, bb: BasebandConfig) {
        self.tx_rf = rf;
        self.tx_bb = bb;
    }

    /// Send a payload through the transmit pipeline.
    ///
    /// Appends the arithmetic checksum and prefixes the transmit baseband
    /// preamble. Returns [`Error::NotConnected`] outside transmit mode.
    pub async fn send_bytes(&mut self, payload: &[u8]) -> Result<()> {
        let body = frame::encode(payload);
        trace!(
            payload_len = payload.len(),
            checksum = body[body.len() - 1],
            "sending payload"
        );
        let preamble = self.tx_bb.preamble.clone();
        self.controller.sink_mut()?.send_framed(&preamble, &body).await
    }

    /// Send a text payload (UTF-8 bytes) through the transmit pipeline.
    pub async fn send_str(&mut self, text: &str) -> Result<()> {
        self.send_bytes(text.as_bytes()).await
    }

    /// Serialize the local **receive** configuration and send it to the peer.
    ///
    /// Telling the downstream radio how this radio currently receives tells
    /// it how to configure its transmitter to reach us; the protocol is
    /// asymmetric by design -- you advertise your receive parameters, never
    /// your transmit parameters.
    pub async fn send_uplink_config(&mut self) -> Result<()> {
        let mut cmd_bytes = self.rx_rf.to_bytes();
        cmd_bytes.extend_from_slice(&self.rx_bb.to_bytes());
        debug!(bytes = cmd_bytes.len(), "sending uplink configuration");
        self.send_bytes(&cmd_bytes).await
    }

    /// Receive one payload from the receive pipeline, blocking until a
    /// frame arrives.
    ///
    /// Frames that fail the checksum or carry the keep-alive filler are
    /// dropped and yield `Ok(vec![])`. Returns [`Error::NotConnected`]
    /// outside receive mode. The remote unit uses this unguarded form; the
    /// host should use [`recv_bytes_timeout`](Self::recv_bytes_timeout).
    pub async fn recv_bytes(&mut self) -> Result<Vec<u8>> {
        let raw = self.controller.source_mut()?.poll_frame().await?;
        match frame::decode_verbose(&raw) {
            FrameOutcome::Payload(payload) => Ok(payload),
            FrameOutcome::ChecksumMismatch => {
                let _ = self.event_tx.send(LinkEvent::FrameDropped {
                    reason: DropReason::ChecksumMismatch,
                });
                Ok(Vec::new())
            }
            FrameOutcome::KeepAlive => {
                trace!("keep-alive frame filtered");
                let _ = self.event_tx.send(LinkEvent::FrameDropped {
                    reason: DropReason::KeepAlive,
                });
                Ok(Vec::new())
            }
            FrameOutcome::Truncated => {
                debug!(len = raw.len(), "truncated frame dropped");
                let _ = self.event_tx.send(LinkEvent::FrameDropped {
                    reason: DropReason::Truncated,
                });
                Ok(Vec::new())
            }
        }
    }

    /// Receive one payload as text, blocking. Best-effort decode: a dropped
    /// frame or invalid UTF-8 yields an empty string.
    pub async fn recv_str(&mut self) -> Result<String> {
        let payload = self.recv_bytes().await?;
        Ok(String::from_utf8(payload).unwrap_or_default())
    }

    /// Receive one payload with a deadline.
    ///
    /// `timeout` of `None` uses the stack default (10 seconds). Expiry
    /// yields `Ok(vec![])`; the caller treats "empty" and "no data yet"
    /// identically.
    pub async fn recv_bytes_timeout(&mut self, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let limit = timeout.unwrap_or(self.recv_timeout);
        // recv_bytes checks the endpoint after the race starts; surface the
        // state error before arming the deadline.
        self.controller.source_mut()?;
        recv_guarded(self.recv_bytes(), limit).await
    }

    /// Receive one payload as text with a deadline.
    ///
    /// `timeout` of `None` uses the stack default (2 seconds).
    pub async fn recv_str_timeout(&mut self, timeout: Option<Duration>) -> Result<String> {
        let limit = timeout.unwrap_or(self.text_timeout);
        self.controller.source_mut()?;
        let payload = recv_guarded(self.recv_bytes(), limit).await?;
        Ok(String::from_utf8(payload).unwrap_or_default())
    }
}
