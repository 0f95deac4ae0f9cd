pub mod clock;
pub mod download;
pub mod ping;
pub mod transport;
pub mod upload;

use crate::settings::Settings;
use clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info};
use transport::Transport;

use download::DownloadTest;
use ping::PingTest;
use upload::UploadTest;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedTestResult {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: Option<u64>,
    pub download_bytes: u64,
    pub upload_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    Ping,
    Download,
    Upload,
    Completed,
    Failed,
}

impl TestPhase {
    pub fn is_running(self) -> bool {
        matches!(self, TestPhase::Ping | TestPhase::Download | TestPhase::Upload)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, TestPhase::Completed | TestPhase::Failed)
    }

    pub fn advance(self, next: TestPhase) -> Result<TestPhase, SampleError> {
        let allowed = matches!(
            (self, next),
            (TestPhase::Idle, TestPhase::Ping)
                | (TestPhase::Ping, TestPhase::Download)
                | (TestPhase::Download, TestPhase::Upload)
                | (TestPhase::Upload, TestPhase::Completed)
        ) || (self.is_running() && next == TestPhase::Failed);

        if allowed {
            Ok(next)
        } else {
            Err(SampleError::Unexpected(format!(
                "illegal phase transition {:?} -> {:?}",
                self, next
            )))
        }
    }

    pub fn status_text(self) -> &'static str {
        match self {
            TestPhase::Idle => "Ready",
            TestPhase::Ping => "Testing Ping...",
            TestPhase::Download => "Measuring Download Speed...",
            TestPhase::Upload => "Measuring Upload Speed...",
            TestPhase::Completed => "Test Completed",
            TestPhase::Failed => "Test Failed - Please try again",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl SampleError {
    pub fn is_network(&self) -> bool {
        matches!(self, SampleError::Network(_))
    }
}

impl From<reqwest::Error> for SampleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            SampleError::Unexpected(err.to_string())
        } else {
            SampleError::Network(err.to_string())
        }
    }
}

// Mbps as 2^20 bits per second.
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    Some((bytes as f64 * 8.0) / (1024.0 * 1024.0 * secs))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedProgress {
    pub mbps: f64,
    pub bytes: u64,
    pub elapsed: Duration,
    pub budget: Duration,
}

impl SpeedProgress {
    pub fn fraction(&self) -> f64 {
        if self.budget.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.budget.as_secs_f64()).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestUpdate {
    Phase(TestPhase),
    PingComplete { latency_ms: Option<u64> },
    DownloadProgress(SpeedProgress),
    UploadProgress(SpeedProgress),
}

pub struct Sampler {
    settings: Settings,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    phase: TestPhase,
}

impl Sampler {
    pub fn new(settings: Settings, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            transport,
            clock,
            phase: TestPhase::Idle,
        }
    }

    pub async fn run_full_test(
        &mut self,
        update_tx: mpsc::Sender<TestUpdate>,
    ) -> Result<SpeedTestResult, SampleError> {
        self.phase = TestPhase::Idle;

        match self.run_phases(&update_tx).await {
            Ok(result) => {
                info!(
                    ping_ms = ?result.ping_ms,
                    download_mbps = result.download_mbps,
                    upload_mbps = result.upload_mbps,
                    download_bytes = result.download_bytes,
                    upload_bytes = result.upload_bytes,
                    "speed test completed"
                );
                Ok(result)
            }
            Err(err) => {
                error!(error = %err, phase = ?self.phase, "speed test failed");
                if self.phase.is_running() {
                    self.phase = TestPhase::Failed;
                    let _ = update_tx.send(TestUpdate::Phase(TestPhase::Failed)).await;
                }
                Err(err)
            }
        }
    }

    async fn run_phases(
        &mut self,
        update_tx: &mpsc::Sender<TestUpdate>,
    ) -> Result<SpeedTestResult, SampleError> {
        let transport = Arc::clone(&self.transport);
        let clock = Arc::clone(&self.clock);
        let mut result = SpeedTestResult::default();

        self.enter(TestPhase::Ping, update_tx).await?;
        let ping = PingTest::new(&self.settings.ping_url)
            .run(transport.as_ref(), clock.as_ref())
            .await?;
        result.ping_ms = ping.latency_ms;
        let _ = update_tx
            .send(TestUpdate::PingComplete {
                latency_ms: ping.latency_ms,
            })
            .await;

        self.enter(TestPhase::Download, update_tx).await?;
        let download = DownloadTest::new(&self.settings)
            .run(transport.as_ref(), clock.as_ref(), update_tx)
            .await?;
        result.download_mbps = download.last_speed_mbps;
        result.download_bytes = download.bytes;

        self.enter(TestPhase::Upload, update_tx).await?;
        let upload = UploadTest::new(&self.settings)
            .run(transport.as_ref(), clock.as_ref(), update_tx)
            .await?;
        result.upload_mbps = upload.last_speed_mbps;
        result.upload_bytes = upload.bytes;

        self.enter(TestPhase::Completed, update_tx).await?;
        Ok(result)
    }

    async fn enter(
        &mut self,
        next: TestPhase,
        update_tx: &mpsc::Sender<TestUpdate>,
    ) -> Result<(), SampleError> {
        self.phase = self.phase.advance(next)?;
        info!(phase = ?next, "entering phase");
        let _ = update_tx.send(TestUpdate::Phase(next)).await;
        Ok(())
    }
}
