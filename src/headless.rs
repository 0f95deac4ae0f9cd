use crate::app::App;
use crate::speedtest::{Sampler, TestPhase, TestUpdate};
use anyhow::Result;
use std::io::Write;
use tokio::sync::mpsc;

pub async fn run_headless(mut app: App, mut sampler: Sampler, out: &mut impl Write) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(32);
    app.begin_test();

    let handle = tokio::spawn(async move { sampler.run_full_test(tx).await });

    while let Some(update) = rx.recv().await {
        let line = describe(&update);
        app.apply(update);
        if let Some(line) = line {
            writeln!(out, "{line}")?;
        }
    }
    app.sampler_gone();

    // Failures were already reflected in the phase; the error itself is logged
    // by the sampler.
    let _ = handle.await?;

    writeln!(out, "{}", app.status_text())?;
    writeln!(out, "  latency   {}", app.latency_text())?;
    writeln!(out, "  download  {}", app.download_text())?;
    writeln!(out, "  upload    {}", app.upload_text())?;

    if app.phase == TestPhase::Failed {
        anyhow::bail!("speed test failed");
    }
    Ok(())
}

fn describe(update: &TestUpdate) -> Option<String> {
    match update {
        TestUpdate::Phase(phase) if phase.is_running() => Some(phase.status_text().to_string()),
        TestUpdate::PingComplete { latency_ms } => {
            Some(format!("  ping {} ms", latency_ms.unwrap_or(0)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::speedtest::clock::FakeClock;
    use crate::speedtest::transport::FakeTransport;
    use std::sync::Arc;
    use std::time::Duration;

    fn settings() -> Settings {
        Settings {
            download_duration: Duration::from_secs(1),
            upload_duration: Duration::from_secs(1),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn prints_summary_after_run() {
        let clock = Arc::new(FakeClock::new());
        let transport = Arc::new(
            FakeTransport::new(Arc::clone(&clock))
                .with_probe_delay(Duration::from_millis(18))
                .with_chunks(vec![131_072], Duration::from_millis(500))
                .with_post_delay(Duration::from_millis(500)),
        );
        let sampler = Sampler::new(settings(), transport, clock);

        let mut out = Vec::new();
        run_headless(App::new(settings()), sampler, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Testing Ping..."));
        assert!(text.contains("  ping 18 ms"));
        assert!(text.contains("Measuring Upload Speed..."));
        assert!(text.contains("Test Completed"));
        // 262_144 bytes over one second.
        assert!(text.contains("download  2.00 Mbps"));
    }

    #[tokio::test]
    async fn failed_run_reports_error() {
        let clock = Arc::new(FakeClock::new());
        let transport = Arc::new(
            FakeTransport::new(Arc::clone(&clock))
                .with_chunks(vec![1024], Duration::from_millis(500))
                .broken_uploads(),
        );
        let sampler = Sampler::new(settings(), transport, clock);

        let mut out = Vec::new();
        let result = run_headless(App::new(settings()), sampler, &mut out).await;
        let text = String::from_utf8(out).unwrap();

        assert!(result.is_err());
        assert!(text.contains("Test Failed - Please try again"));
    }
}
