//! Data path traits -- the signal-processing pipeline contract.
//!
//! A [`DataPath`] is a running receive or transmit pipeline bound to the
//! radio hardware. The controller only needs start/stop; everything about
//! modulation, filtering, and hardware drivers stays behind the
//! [`DataPathFactory`] seam, enabling both real SDR pipelines and inert
//! test paths.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::types::{BasebandConfig, RfConfig, SdrSelector};

/// A receive or transmit signal-processing pipeline.
///
/// The controller guarantees one `stop()` per successful `start()` and never
/// runs two paths at once. `stop()` may return before the pipeline has fully
/// drained; the controller inserts a settle delay before touching shared
/// resources.
#[async_trait]
pub trait DataPath: Send + Sync {
    /// Start the pipeline.
    async fn start(&mut self) -> Result<()>;

    /// Stop the pipeline.
    async fn stop(&mut self) -> Result<()>;
}

/// Creates data paths for the selected SDR hardware.
///
/// Implementations own the mapping from [`SdrSelector`] to a concrete
/// driver. Configuration is passed by reference and must be applied before
/// the returned path is started; the path keeps its own copy and never reads
/// the caller's configuration again.
#[async_trait]
pub trait DataPathFactory: Send + Sync {
    /// Create a receive pipeline demodulating onto the endpoint at `addr`.
    async fn create_rx_path(
        &self,
        sdr: SdrSelector,
        rf: &RfConfig,
        bb: &BasebandConfig,
        addr: &str,
    ) -> Result<Box<dyn DataPath>>;

    /// Create a transmit pipeline modulating bytes from the endpoint at `addr`.
    async fn create_tx_path(
        &self,
        sdr: SdrSelector,
        rf: &RfConfig,
        bb: &BasebandConfig,
        addr: &str,
    ) -> Result<Box<dyn DataPath>>;
}

/// A data path that does nothing.
///
/// Used for [`SdrSelector::Test`], where frames travel over the transport
/// endpoints directly and no radio hardware is involved.
#[derive(Debug, Default)]
pub struct NullDataPath {
    running: bool,
}

impl NullDataPath {
    /// Create a stopped null path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `start()` has been called without a matching `stop()`.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[async_trait]
impl DataPath for NullDataPath {
    async fn start(&mut self) -> Result<()> {
        debug!("null data path started");
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        debug!("null data path stopped");
        self.running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_path_start_stop() {
        let mut path = NullDataPath::new();
        assert!(!path.is_running());

        path.start().await.unwrap();
        assert!(path.is_running());

        path.stop().await.unwrap();
        assert!(!path.is_running());
    }

    #[test]
    fn data_path_is_object_safe() {
        fn assert_object_safe(_: &dyn DataPath) {}
        let path = NullDataPath::new();
        assert_object_safe(&path);
    }
}
