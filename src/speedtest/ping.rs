use super::clock::Clock;
use super::transport::Transport;
use super::SampleError;
use tracing::{debug, warn};

pub struct PingTest {
    url: String,
}

impl PingTest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    pub async fn run(
        &self,
        transport: &dyn Transport,
        clock: &dyn Clock,
    ) -> Result<PingResult, SampleError> {
        let start = clock.now();

        match transport.probe(&self.url).await {
            Ok(()) => {
                let elapsed = clock.now().saturating_sub(start);
                let latency_ms = (elapsed.as_secs_f64() * 1000.0).round() as u64;
                debug!(latency_ms, url = %self.url, "ping answered");
                Ok(PingResult {
                    latency_ms: Some(latency_ms),
                })
            }
            Err(err) if err.is_network() => {
                warn!(error = %err, url = %self.url, "ping test failed");
                Ok(PingResult { latency_ms: None })
            }
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingResult {
    pub latency_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::clock::FakeClock;
    use crate::speedtest::transport::FakeTransport;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn reports_rounded_milliseconds() {
        let clock = Arc::new(FakeClock::new());
        let transport =
            FakeTransport::new(Arc::clone(&clock)).with_probe_delay(Duration::from_micros(42_600));

        let result = PingTest::new("https://ping.test")
            .run(&transport, clock.as_ref())
            .await
            .unwrap();

        assert_eq!(result.latency_ms, Some(43));
    }

    #[tokio::test]
    async fn network_failure_yields_no_reading() {
        let clock = Arc::new(FakeClock::new());
        let transport = FakeTransport::new(Arc::clone(&clock)).failing_probe();

        let result = PingTest::new("https://ping.test")
            .run(&transport, clock.as_ref())
            .await
            .unwrap();

        assert_eq!(result.latency_ms, None);
    }

    #[tokio::test]
    async fn unexpected_failure_propagates() {
        let clock = Arc::new(FakeClock::new());
        let transport = FakeTransport::new(Arc::clone(&clock)).broken_probe();

        let err = PingTest::new("https://ping.test")
            .run(&transport, clock.as_ref())
            .await
            .unwrap_err();

        assert!(!err.is_network());
    }
}
