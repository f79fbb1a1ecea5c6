//! Mock backend for deterministic testing of the controller and stack.
//!
//! [`MockBackend`] implements both backend seams. Data paths it creates
//! record their lifecycle into shared state, sinks record every frame they
//! send, and sources replay a preloaded FIFO of frames -- then block
//! forever, like a quiet radio link, which is exactly what guarded-receive
//! tests need to race a deadline against.
//!
//! # Example
//!
//! ```
//! use halflink_test_harness::MockBackend;
//!
//! let backend = MockBackend::new();
//! // Pre-load a frame the next receive will deliver.
//! backend.push_rx_frame(&[1, 2, 3, 6]);
//! // Make the next created path fail its start() for rollback tests.
//! backend.fail_next_start();
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use halflink_core::datapath::{DataPath, DataPathFactory};
use halflink_core::endpoint::{EndpointConnector, FrameSink, FrameSource};
use halflink_core::error::{Error, Result};
use halflink_core::types::{BasebandConfig, RfConfig, SdrSelector};

/// Which direction a mock data path serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// A receive pipeline.
    Receive,
    /// A transmit pipeline.
    Transmit,
}

/// Lifecycle state of a mock data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// Created but never started.
    Created,
    /// `start()` succeeded, no `stop()` yet.
    Started,
    /// `stop()` was called.
    Stopped,
}

/// One frame recorded by a mock sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    /// The preamble passed to `send_framed`.
    pub preamble: Vec<u8>,
    /// The checksummed body passed to `send_framed`.
    pub body: Vec<u8>,
}

#[derive(Debug)]
struct PathRecord {
    kind: PathKind,
    status: PathStatus,
}

/// A mock data path recording its lifecycle into the backend.
pub struct MockDataPath {
    record: Arc<Mutex<PathRecord>>,
    fail_start: bool,
}

#[async_trait]
impl DataPath for MockDataPath {
    async fn start(&mut self) -> Result<()> {
        if self.fail_start {
            return Err(Error::DataPath("mock start failure".into()));
        }
        self.record.lock().unwrap().status = PathStatus::Started;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.record.lock().unwrap().status = PathStatus::Stopped;
        Ok(())
    }
}

/// A mock [`FrameSink`] recording every sent frame into a shared log.
pub struct MockFrameSink {
    log: Arc<Mutex<Vec<SentFrame>>>,
    open_count: Arc<AtomicUsize>,
    connected: bool,
}

#[async_trait]
impl FrameSink for MockFrameSink {
    async fn send_framed(&mut self, preamble: &[u8], body: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.log.lock().unwrap().push(SentFrame {
            preamble: preamble.to_vec(),
            body: body.to_vec(),
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.connected {
            self.connected = false;
            self.open_count.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// A mock [`FrameSource`] replaying preloaded frames, then blocking forever.
pub struct MockFrameSource {
    frames: Arc<Mutex<VecDeque<Vec<u8>>>>,
    open_count: Arc<AtomicUsize>,
    connected: bool,
}

#[async_trait]
impl FrameSource for MockFrameSource {
    async fn poll_frame(&mut self) -> Result<Vec<u8>> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if let Some(frame) = self.frames.lock().unwrap().pop_front() {
            return Ok(frame);
        }
        // Nothing queued: behave like a silent link and block until the
        // caller's deadline (if any) abandons us.
        std::future::pending::<()>().await;
        unreachable!()
    }

    async fn close(&mut self) -> Result<()> {
        if self.connected {
            self.connected = false;
            self.open_count.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Mock implementation of both backend seams.
///
/// Cloning shares the underlying state, so tests keep one handle for
/// assertions and hand clones to the controller/stack under test.
#[derive(Clone, Default)]
pub struct MockBackend {
    paths: Arc<Mutex<Vec<Arc<Mutex<PathRecord>>>>>,
    rx_configs: Arc<Mutex<Vec<(RfConfig, BasebandConfig)>>>,
    tx_configs: Arc<Mutex<Vec<(RfConfig, BasebandConfig)>>>,
    fail_next_start: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<SentFrame>>>,
    rx_frames: Arc<Mutex<VecDeque<Vec<u8>>>>,
    open_sinks: Arc<AtomicUsize>,
    open_sources: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next created data path fail its `start()`.
    pub fn fail_next_start(&self) {
        self.fail_next_start.store(true, Ordering::SeqCst);
    }

    /// Queue a frame body for the next source to deliver.
    pub fn push_rx_frame(&self, frame: &[u8]) {
        self.rx_frames.lock().unwrap().push_back(frame.to_vec());
    }

    /// All frames sent through sinks created by this backend.
    pub fn sent_frames(&self) -> Vec<SentFrame> {
        self.sent.lock().unwrap().clone()
    }

    /// Total number of data paths ever created.
    pub fn created_paths(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    /// Number of data paths currently in the `Started` state.
    pub fn active_paths(&self) -> usize {
        self.paths
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.lock().unwrap().status == PathStatus::Started)
            .count()
    }

    /// Lifecycle records of every created path, in creation order.
    pub fn path_records(&self) -> Vec<(PathKind, PathStatus)> {
        self.paths
            .lock()
            .unwrap()
            .iter()
            .map(|p| {
                let record = p.lock().unwrap();
                (record.kind, record.status)
            })
            .collect()
    }

    /// The configuration snapshot passed to the most recent receive path.
    pub fn last_rx_config(&self) -> Option<(RfConfig, BasebandConfig)> {
        self.rx_configs.lock().unwrap().last().cloned()
    }

    /// The configuration snapshot passed to the most recent transmit path.
    pub fn last_tx_config(&self) -> Option<(RfConfig, BasebandConfig)> {
        self.tx_configs.lock().unwrap().last().cloned()
    }

    /// Number of sinks currently open.
    pub fn open_sinks(&self) -> usize {
        self.open_sinks.load(Ordering::SeqCst)
    }

    /// Number of sources currently open.
    pub fn open_sources(&self) -> usize {
        self.open_sources.load(Ordering::SeqCst)
    }

    fn create_path(&self, kind: PathKind) -> Box<dyn DataPath> {
        let record = Arc::new(Mutex::new(PathRecord {
            kind,
            status: PathStatus::Created,
        }));
        self.paths.lock().unwrap().push(record.clone());
        Box::new(MockDataPath {
            record,
            fail_start: self.fail_next_start.swap(false, Ordering::SeqCst),
        })
    }
}

#[async_trait]
impl DataPathFactory for MockBackend {
    async fn create_rx_path(
        &self,
        _sdr: SdrSelector,
        rf: &RfConfig,
        bb: &BasebandConfig,
        _addr: &str,
    ) -> Result<Box<dyn DataPath>> {
        self.rx_configs
            .lock()
            .unwrap()
            .push((rf.clone(), bb.clone()));
        Ok(self.create_path(PathKind::Receive))
    }

    async fn create_tx_path(
        &self,
        _sdr: SdrSelector,
        rf: &RfConfig,
        bb: &BasebandConfig,
        _addr: &str,
    ) -> Result<Box<dyn DataPath>> {
        self.tx_configs
            .lock()
            .unwrap()
            .push((rf.clone(), bb.clone()));
        Ok(self.create_path(PathKind::Transmit))
    }
}

#[async_trait]
impl EndpointConnector for MockBackend {
    async fn connect_sink(&self, _addr: &str) -> Result<Box<dyn FrameSink>> {
        self.open_sinks.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockFrameSink {
            log: self.sent.clone(),
            open_count: self.open_sinks.clone(),
            connected: true,
        }))
    }

    async fn connect_source(&self, _addr: &str) -> Result<Box<dyn FrameSource>> {
        self.open_sources.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockFrameSource {
            frames: self.rx_frames.clone(),
            open_count: self.open_sources.clone(),
            connected: true,
        }))
    }
}
