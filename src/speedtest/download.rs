use super::clock::Clock;
use super::transport::Transport;
use super::{throughput_mbps, SampleError, SpeedProgress, TestUpdate};
use crate::settings::Settings;
use futures::StreamExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub struct DownloadTest {
    url: String,
    duration: Duration,
    max_speed: f64,
    downloaded: u64,
    last_speed: f64,
    fetches: u64,
}

impl DownloadTest {
    pub fn new(settings: &Settings) -> Self {
        Self {
            url: settings.download_url.clone(),
            duration: settings.download_duration,
            max_speed: settings.max_speed(),
            downloaded: 0,
            last_speed: 0.0,
            fetches: 0,
        }
    }

    // A fetch still streaming at the deadline is drained, not cut off.
    pub async fn run(
        &mut self,
        transport: &dyn Transport,
        clock: &dyn Clock,
        progress_tx: &mpsc::Sender<TestUpdate>,
    ) -> Result<DownloadResult, SampleError> {
        let start = clock.now();
        self.downloaded = 0;
        self.last_speed = 0.0;

        while clock.now().saturating_sub(start) < self.duration {
            match self.fetch_once(transport, clock, start, progress_tx).await {
                Ok(()) => {}
                Err(err) if err.is_network() => {
                    warn!(error = %err, downloaded = self.downloaded, "download test failed");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            bytes = self.downloaded,
            fetches = self.fetches,
            mbps = self.last_speed,
            "download phase finished"
        );

        Ok(DownloadResult {
            last_speed_mbps: self.last_speed,
            bytes: self.downloaded,
        })
    }

    async fn fetch_once(
        &mut self,
        transport: &dyn Transport,
        clock: &dyn Clock,
        start: Duration,
        progress_tx: &mpsc::Sender<TestUpdate>,
    ) -> Result<(), SampleError> {
        let url = cache_busted(&self.url, self.fetches);
        self.fetches += 1;
        trace!(%url, "fetching download resource");

        let mut stream = transport.fetch(&url).await?;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            self.downloaded += chunk.len() as u64;

            let elapsed = clock.now().saturating_sub(start);
            let Some(mbps) = throughput_mbps(self.downloaded, elapsed) else {
                continue;
            };
            self.last_speed = mbps.min(self.max_speed);
            debug!(mbps = self.last_speed, bytes = self.downloaded, "download sample");

            let _ = progress_tx
                .send(TestUpdate::DownloadProgress(SpeedProgress {
                    mbps: self.last_speed,
                    bytes: self.downloaded,
                    elapsed,
                    budget: self.duration,
                }))
                .await;
        }

        Ok(())
    }
}

fn cache_busted(url: &str, n: u64) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}t={millis}-{n}")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadResult {
    pub last_speed_mbps: f64,
    pub bytes: u64,
}
