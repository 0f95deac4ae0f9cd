use crate::gauge::GaugeState;
use crate::settings::Settings;
use crate::speedtest::{SpeedProgress, TestPhase, TestUpdate};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tracing::{debug, error, trace};

pub const START_LABEL: &str = "Start Test";
pub const RUNNING_LABEL: &str = "Testing...";
pub const RESTART_LABEL: &str = "Start New Test";

const PING_WEIGHT: f64 = 25.0;
const TRANSFER_WEIGHT: f64 = 37.5;

pub struct App {
    pub phase: TestPhase,
    pub failed_in: Option<TestPhase>,
    pub settings: Settings,
    pub gauge: GaugeState,
    pub should_quit: bool,

    pub latency_ms: u64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub progress: f64,

    pub start_enabled: bool,
    pub start_label: &'static str,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            phase: TestPhase::Idle,
            failed_in: None,
            settings,
            gauge: GaugeState::default(),
            should_quit: false,
            latency_ms: 0,
            download_mbps: 0.0,
            upload_mbps: 0.0,
            progress: 0.0,
            start_enabled: true,
            start_label: START_LABEL,
        }
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc if !self.phase.is_running() => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Enter | KeyCode::Char(' ') if self.start_enabled => Some(AppAction::StartTest),
            _ => None,
        }
    }

    pub fn begin_test(&mut self) {
        self.phase = TestPhase::Idle;
        self.failed_in = None;
        self.latency_ms = 0;
        self.download_mbps = 0.0;
        self.upload_mbps = 0.0;
        self.progress = 0.0;
        self.start_enabled = false;
        self.start_label = RUNNING_LABEL;
        self.set_speed(0.0);
    }

    pub fn apply(&mut self, update: TestUpdate) {
        match update {
            TestUpdate::Phase(next) => self.enter_phase(next),
            TestUpdate::PingComplete { latency_ms } => match latency_ms {
                Some(ms) => {
                    self.latency_ms = ms;
                    self.progress = PING_WEIGHT;
                }
                None => self.latency_ms = 0,
            },
            TestUpdate::DownloadProgress(p) => {
                trace!(bytes = p.bytes, mbps = p.mbps, "download reading");
                self.download_mbps = p.mbps;
                self.set_speed(p.mbps);
                self.raise_progress(download_progress(&p));
            }
            TestUpdate::UploadProgress(p) => {
                trace!(bytes = p.bytes, mbps = p.mbps, "upload reading");
                self.upload_mbps = p.mbps;
                self.set_speed(p.mbps);
                self.raise_progress(upload_progress(&p));
            }
        }
    }

    fn enter_phase(&mut self, next: TestPhase) {
        match self.phase.advance(next) {
            Ok(phase) => {
                debug!(from = ?self.phase, to = ?phase, "widget phase change");
                if phase == TestPhase::Failed {
                    self.failed_in = Some(self.phase);
                }
                self.phase = phase;
                match phase {
                    TestPhase::Download => self.raise_progress(PING_WEIGHT),
                    TestPhase::Upload => self.raise_progress(PING_WEIGHT + TRANSFER_WEIGHT),
                    TestPhase::Completed => {
                        self.progress = 100.0;
                        self.finish();
                    }
                    TestPhase::Failed => self.finish(),
                    _ => {}
                }
            }
            Err(err) => {
                error!(error = %err, "rejecting phase update");
                self.fail();
            }
        }
    }

    pub fn sampler_gone(&mut self) {
        if !self.phase.is_finished() && !self.start_enabled {
            self.fail();
        }
    }

    fn fail(&mut self) {
        if self.phase.is_running() {
            self.failed_in = Some(self.phase);
        }
        self.phase = TestPhase::Failed;
        self.finish();
    }

    fn finish(&mut self) {
        self.start_enabled = true;
        self.start_label = RESTART_LABEL;
    }

    fn raise_progress(&mut self, value: f64) {
        self.progress = self.progress.max(value.min(100.0));
    }

    pub fn set_speed(&mut self, mbps: f64) {
        self.gauge.show(&self.settings.gauge, mbps);
    }

    pub fn resize(&mut self, container_width: u32) {
        if self.gauge.resize(&self.settings.gauge, container_width) {
            debug!(side = self.gauge.side(), "gauge resized");
        }
    }

    pub fn status_text(&self) -> &'static str {
        self.phase.status_text()
    }

    pub fn latency_text(&self) -> String {
        format!("{} ms", self.latency_ms)
    }

    pub fn download_text(&self) -> String {
        format!("{:.2} Mbps", self.download_mbps)
    }

    pub fn upload_text(&self) -> String {
        format!("{:.2} Mbps", self.upload_mbps)
    }

    pub fn speed_text(&self) -> String {
        format!("{:.1}", self.gauge.speed())
    }
}

fn download_progress(p: &SpeedProgress) -> f64 {
    PING_WEIGHT + TRANSFER_WEIGHT * p.fraction()
}

fn upload_progress(p: &SpeedProgress) -> f64 {
    PING_WEIGHT + TRANSFER_WEIGHT + TRANSFER_WEIGHT * p.fraction()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    StartTest,
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn progress(mbps: f64, elapsed_ms: u64) -> SpeedProgress {
        SpeedProgress {
            mbps,
            bytes: 0,
            elapsed: Duration::from_millis(elapsed_ms),
            budget: Duration::from_secs(10),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn running_app() -> App {
        let mut app = App::new(Settings::default());
        app.begin_test();
        app
    }

    #[test]
    fn start_is_disabled_while_running() {
        let mut app = App::new(Settings::default());
        assert_eq!(app.handle_key_event(key(KeyCode::Enter)), Some(AppAction::StartTest));

        app.begin_test();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        assert_eq!(app.start_label, RUNNING_LABEL);
        assert_eq!(app.handle_key_event(key(KeyCode::Enter)), None);
        assert_eq!(app.handle_key_event(key(KeyCode::Char('q'))), None);
    }

    #[test]
    fn full_run_rearms_control() {
        let mut app = running_app();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.apply(TestUpdate::PingComplete {
            latency_ms: Some(23),
        });
        app.apply(TestUpdate::Phase(TestPhase::Download));
        app.apply(TestUpdate::DownloadProgress(progress(9.5367431640625, 10_000)));
        app.apply(TestUpdate::Phase(TestPhase::Upload));
        app.apply(TestUpdate::UploadProgress(progress(3.2, 5_000)));
        app.apply(TestUpdate::Phase(TestPhase::Completed));

        assert_eq!(app.phase, TestPhase::Completed);
        assert_eq!(app.latency_text(), "23 ms");
        assert_eq!(app.download_text(), "9.54 Mbps");
        assert_eq!(app.upload_text(), "3.20 Mbps");
        assert_eq!(app.speed_text(), "3.2");
        assert_eq!(app.progress, 100.0);
        assert_eq!(app.status_text(), "Test Completed");
        assert!(app.start_enabled);
        assert_eq!(app.start_label, RESTART_LABEL);
    }

    #[test]
    fn failed_ping_shows_zero_and_continues() {
        let mut app = running_app();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.apply(TestUpdate::PingComplete { latency_ms: None });
        app.apply(TestUpdate::Phase(TestPhase::Download));

        assert_eq!(app.latency_text(), "0 ms");
        assert_eq!(app.phase, TestPhase::Download);
        assert!(!app.start_enabled);
    }

    #[test]
    fn progress_is_weighted_by_phase() {
        let mut app = running_app();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.apply(TestUpdate::PingComplete { latency_ms: Some(5) });
        assert_eq!(app.progress, 25.0);

        app.apply(TestUpdate::Phase(TestPhase::Download));
        app.apply(TestUpdate::DownloadProgress(progress(1.0, 5_000)));
        assert_eq!(app.progress, 43.75);
        app.apply(TestUpdate::DownloadProgress(progress(1.0, 12_000)));
        assert_eq!(app.progress, 62.5);

        app.apply(TestUpdate::Phase(TestPhase::Upload));
        app.apply(TestUpdate::UploadProgress(progress(1.0, 5_000)));
        assert_eq!(app.progress, 81.25);
    }

    #[test]
    fn out_of_order_phase_fails_run() {
        let mut app = running_app();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.apply(TestUpdate::Phase(TestPhase::Upload));

        assert_eq!(app.phase, TestPhase::Failed);
        assert_eq!(app.status_text(), "Test Failed - Please try again");
        assert!(app.start_enabled);
    }

    #[test]
    fn vanished_sampler_counts_as_failure() {
        let mut app = running_app();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.sampler_gone();
        assert_eq!(app.phase, TestPhase::Failed);
        assert_eq!(app.start_label, RESTART_LABEL);

        let mut done = running_app();
        for phase in [
            TestPhase::Ping,
            TestPhase::Download,
            TestPhase::Upload,
            TestPhase::Completed,
        ] {
            done.apply(TestUpdate::Phase(phase));
        }
        done.sampler_gone();
        assert_eq!(done.phase, TestPhase::Completed);
    }

    #[test]
    fn gauge_speed_is_clamped() {
        let mut app = running_app();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.apply(TestUpdate::Phase(TestPhase::Download));
        app.apply(TestUpdate::DownloadProgress(progress(250.0, 1_000)));
        assert_eq!(app.speed_text(), "100.0");
    }

    #[test]
    fn resize_caps_gauge() {
        let mut app = App::new(Settings::default());
        app.resize(800);
        assert_eq!(app.gauge.side(), 500);
        app.resize(240);
        assert_eq!(app.gauge.side(), 240);
    }
}
