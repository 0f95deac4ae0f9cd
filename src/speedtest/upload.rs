use super::clock::Clock;
use super::transport::Transport;
use super::{throughput_mbps, SampleError, SpeedProgress, TestUpdate};
use crate::settings::Settings;
use bytes::Bytes;
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct UploadTest {
    url: String,
    duration: Duration,
    chunk_size: usize,
    max_speed: f64,
}

impl UploadTest {
    pub fn new(settings: &Settings) -> Self {
        Self {
            url: settings.upload_url.clone(),
            duration: settings.upload_duration,
            chunk_size: settings.upload_chunk_size,
            max_speed: settings.max_speed(),
        }
    }

    pub async fn run(
        &mut self,
        transport: &dyn Transport,
        clock: &dyn Clock,
        progress_tx: &mpsc::Sender<TestUpdate>,
    ) -> Result<UploadResult, SampleError> {
        let start = clock.now();
        let mut uploaded: u64 = 0;
        let mut last_speed = 0.0;
        let mut posts: u64 = 0;

        while clock.now().saturating_sub(start) < self.duration {
            let payload = opaque_payload(self.chunk_size);

            match transport.post(&self.url, payload).await {
                Ok(()) => {}
                Err(err) if err.is_network() => {
                    warn!(error = %err, uploaded, "upload test failed");
                    break;
                }
                Err(err) => return Err(err),
            }

            posts += 1;
            uploaded += self.chunk_size as u64;

            let elapsed = clock.now().saturating_sub(start);
            let Some(mbps) = throughput_mbps(uploaded, elapsed) else {
                continue;
            };
            last_speed = mbps.min(self.max_speed);
            debug!(mbps = last_speed, bytes = uploaded, "upload sample");

            let _ = progress_tx
                .send(TestUpdate::UploadProgress(SpeedProgress {
                    mbps: last_speed,
                    bytes: uploaded,
                    elapsed,
                    budget: self.duration,
                }))
                .await;
        }

        info!(bytes = uploaded, posts, mbps = last_speed, "upload phase finished");

        Ok(UploadResult {
            last_speed_mbps: last_speed,
            bytes: uploaded,
        })
    }
}

fn opaque_payload(size: usize) -> Bytes {
    let mut data = vec![0u8; size];
    rand::thread_rng().fill(&mut data[..]);
    Bytes::from(data)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadResult {
    pub last_speed_mbps: f64,
    pub bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::clock::FakeClock;
    use crate::speedtest::transport::FakeTransport;
    use std::sync::Arc;

    fn settings(budget: Duration) -> Settings {
        Settings {
            upload_url: "https://echo.test/post".into(),
            upload_duration: budget,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn posts_fixed_chunks_until_deadline() {
        let clock = Arc::new(FakeClock::new());
        let transport =
            FakeTransport::new(Arc::clone(&clock)).with_post_delay(Duration::from_millis(400));
        let (tx, mut rx) = mpsc::channel(64);

        let result = UploadTest::new(&settings(Duration::from_secs(2)))
            .run(&transport, clock.as_ref(), &tx)
            .await
            .unwrap();

        assert_eq!(transport.post_count(), 5);
        assert_eq!(transport.posted_bytes(), 5 * 51_200);
        assert_eq!(result.bytes, 5 * 51_200);

        let mut samples = Vec::new();
        while let Ok(TestUpdate::UploadProgress(p)) = rx.try_recv() {
            samples.push(p);
        }
        assert_eq!(samples.len(), 5);
        // 51_200 bytes every 400 ms.
        let expected = (51_200.0 * 8.0) / (1024.0 * 1024.0 * 0.4);
        assert!((result.last_speed_mbps - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn network_failure_ends_phase_quietly() {
        let clock = Arc::new(FakeClock::new());
        let transport = FakeTransport::new(Arc::clone(&clock)).failing_uploads();
        let (tx, _rx) = mpsc::channel(8);

        let result = UploadTest::new(&settings(Duration::from_secs(10)))
            .run(&transport, clock.as_ref(), &tx)
            .await
            .unwrap();

        assert_eq!(result.bytes, 0);
        assert_eq!(result.last_speed_mbps, 0.0);
        assert_eq!(transport.post_count(), 0);
    }

    #[tokio::test]
    async fn unexpected_failure_aborts() {
        let clock = Arc::new(FakeClock::new());
        let transport = FakeTransport::new(Arc::clone(&clock)).broken_uploads();
        let (tx, _rx) = mpsc::channel(8);

        let err = UploadTest::new(&settings(Duration::from_secs(10)))
            .run(&transport, clock.as_ref(), &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, SampleError::Unexpected(_)));
    }

    #[test]
    fn payload_has_requested_size() {
        assert_eq!(opaque_payload(51_200).len(), 51_200);
    }
}
