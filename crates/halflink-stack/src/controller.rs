//! Mode controller -- the state machine that owns the shared radio.
//!
//! The receive and transmit pipelines contend for the same physical radio,
//! so at most one data path is ever alive. All transitions funnel through
//! [`switch_to_receive`](ModeController::switch_to_receive),
//! [`switch_to_transmit`](ModeController::switch_to_transmit), and
//! [`shutdown`](ModeController::shutdown); the controller is the sole owner
//! and sole mutator of the data-path handle and both transport endpoints.
//!
//! Teardown is ordered: the data path stops *before* the endpoint that
//! feeds it is released, with a settle delay in between, because the
//! pipeline's `stop()` returns before the flowgraph has drained and the
//! endpoints must outlive it until it has.

use std::time::Duration;

use tracing::{debug, info, warn};

use halflink_core::datapath::{DataPath, DataPathFactory};
use halflink_core::endpoint::{EndpointConnector, FrameSink, FrameSource};
use halflink_core::error::{Error, Result};
use halflink_core::types::{BasebandConfig, Mode, RfConfig, SdrSelector};

/// Default settle delay after stopping a data path.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// State machine arbitrating the shared radio between receive and transmit.
///
/// Operations take `&mut self`, so a second switch cannot start while one
/// is in flight on the same instance -- the no-reentrant-switch requirement
/// is enforced by the borrow checker rather than a runtime lock.
pub struct ModeController {
    mode: Mode,
    /// The active pipeline, if any. At most one alive at any time.
    path: Option<Box<dyn DataPath>>,
    /// Outbound endpoint; populated only in transmit mode.
    sink: Option<Box<dyn FrameSink>>,
    /// Inbound endpoint; populated only in receive mode.
    source: Option<Box<dyn FrameSource>>,
    factory: Box<dyn DataPathFactory>,
    connector: Box<dyn EndpointConnector>,
    settle_delay: Duration,
}

impl ModeController {
    /// Create an idle controller over the given backend seams.
    pub fn new(factory: Box<dyn DataPathFactory>, connector: Box<dyn EndpointConnector>) -> Self {
        Self {
            mode: Mode::Idle,
            path: None,
            sink: None,
            source: None,
            factory,
            connector,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Override the settle delay applied after stopping a data path.
    pub fn set_settle_delay(&mut self, delay: Duration) {
        self.settle_delay = delay;
    }

    /// The current operating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch to receive mode.
    ///
    /// Tears down any active path first (a no-op when idle), then creates a
    /// receive pipeline for `rf`/`bb`, binds a fresh inbound endpoint at
    /// `addr`, and starts the pipeline. On any failure the controller is
    /// left idle with nothing bound.
    pub async fn switch_to_receive(
        &mut self,
        sdr: SdrSelector,
        rf: &RfConfig,
        bb: &BasebandConfig,
        addr: &str,
    ) -> Result<()> {
        self.shutdown().await;

        debug!(addr = %addr, sdr = %sdr, "bringing up receive path");
        let mut path = self.factory.create_rx_path(sdr, rf, bb, addr).await?;
        let mut source = self.connector.connect_source(addr).await?;

        if let Err(e) = path.start().await {
            warn!(error = %e, "receive path failed to start, rolling back");
            if let Err(close_err) = source.close().await {
                warn!(error = %close_err, "failed to close inbound endpoint during rollback");
            }
            return Err(e);
        }

        self.path = Some(path);
        self.source = Some(source);
        self.mode = Mode::Receiving;
        info!(addr = %addr, "receive path active");
        Ok(())
    }

    /// Switch to transmit mode.
    ///
    /// Symmetric to [`switch_to_receive`](Self::switch_to_receive): tears
    /// down any active path, creates and starts a transmit pipeline, binds
    /// a fresh outbound endpoint.
    pub async fn switch_to_transmit(
        &mut self,
        sdr: SdrSelector,
        rf: &RfConfig,
        bb: &BasebandConfig,
        addr: &str,
    ) -> Result<()> {
        self.shutdown().await;

        debug!(addr = %addr, sdr = %sdr, "bringing up transmit path");
        let mut path = self.factory.create_tx_path(sdr, rf, bb, addr).await?;
        let mut sink = self.connector.connect_sink(addr).await?;

        if let Err(e) = path.start().await {
            warn!(error = %e, "transmit path failed to start, rolling back");
            if let Err(close_err) = sink.close().await {
                warn!(error = %close_err, "failed to close outbound endpoint during rollback");
            }
            return Err(e);
        }

        self.path = Some(path);
        self.sink = Some(sink);
        self.mode = Mode::Transmitting;
        info!(addr = %addr, "transmit path active");
        Ok(())
    }

    /// Stop the active data path and release both endpoints.
    ///
    /// Safe to call repeatedly and when already idle. Teardown failures are
    /// logged and do not abort the teardown; after this returns the
    /// controller is idle with nothing bound.
    pub async fn shutdown(&mut self) {
        if let Some(mut path) = self.path.take() {
            debug!(mode = %self.mode, "stopping active data path");
            if let Err(e) = path.stop().await {
                warn!(error = %e, "data path stop failed (continuing teardown)");
            }
            // stop() acknowledges before the pipeline has drained; the
            // endpoints must stay bound until it has.
            tokio::time::sleep(self.settle_delay).await;
        }

        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close().await {
                warn!(error = %e, "failed to close outbound endpoint");
            }
        }
        if let Some(mut source) = self.source.take() {
            if let Err(e) = source.close().await {
                warn!(error = %e, "failed to close inbound endpoint");
            }
        }

        if self.mode != Mode::Idle {
            info!("link idle");
            self.mode = Mode::Idle;
        }
    }

    /// The outbound endpoint, or `NotConnected` outside transmit mode.
    pub fn sink_mut(&mut self) -> Result<&mut dyn FrameSink> {
        match self.sink.as_deref_mut() {
            Some(sink) => Ok(sink),
            None => Err(Error::NotConnected),
        }
    }

    /// The inbound endpoint, or `NotConnected` outside receive mode.
    pub fn source_mut(&mut self) -> Result<&mut dyn FrameSource> {
        match self.source.as_deref_mut() {
            Some(source) => Ok(source),
            None => Err(Error::NotConnected),
        }
    }
}
