use super::gauge_widget::{GaugeCanvas, DOTS_PER_COL, DOTS_PER_ROW};
use crate::app::App;
use crate::gauge::surface::RecordingSurface;
use crate::speedtest::TestPhase;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const ACCENT: Color = Color::Rgb(100, 149, 237);
const SUCCESS: Color = Color::Rgb(134, 194, 156);
const INFO: Color = Color::Rgb(147, 180, 220);
const WARN: Color = Color::Rgb(220, 180, 130);
const DANGER: Color = Color::Rgb(229, 57, 53);
const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
const TEXT_SECONDARY: Color = Color::Rgb(160, 160, 160);
const TEXT_MUTED: Color = Color::Rgb(100, 100, 100);
const BORDER: Color = Color::Rgb(60, 60, 65);
const BAR_DIM: Color = Color::Rgb(50, 55, 70);

const READOUT_WIDTH: u16 = 26;

struct Regions {
    header: Rect,
    gauge: Rect,
    readouts: Rect,
    progress: Rect,
    help: Rect,
}

fn regions(area: Rect) -> Regions {
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(area);

    let body = Layout::horizontal([Constraint::Min(10), Constraint::Length(READOUT_WIDTH)])
        .split(rows[1]);

    Regions {
        header: rows[0],
        gauge: body[0],
        readouts: body[1],
        progress: rows[2],
        help: rows[3],
    }
}

// Braille dots.
pub fn gauge_container_width(area: Rect) -> u32 {
    let gauge = regions(area).gauge;
    (gauge.width as u32 * DOTS_PER_COL).min(gauge.height as u32 * DOTS_PER_ROW)
}

pub fn draw_ui(frame: &mut Frame, app: &App) {
    let regions = regions(frame.area());

    draw_header(frame, regions.header, app);
    draw_gauge(frame, regions.gauge, app);
    draw_readouts(frame, regions.readouts, app);
    draw_progress_bar(frame, regions.progress, app.progress);
    draw_help(frame, regions.help, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::horizontal([
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(20),
    ])
    .split(inner);

    frame.render_widget(
        Paragraph::new("gaugespeed")
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    let color = match app.phase {
        TestPhase::Idle => TEXT_MUTED,
        TestPhase::Ping => WARN,
        TestPhase::Download => SUCCESS,
        TestPhase::Upload => INFO,
        TestPhase::Completed => ACCENT,
        TestPhase::Failed => DANGER,
    };

    frame.render_widget(
        Paragraph::new(app.status_text())
            .style(Style::default().fg(color))
            .alignment(Alignment::Center),
        chunks[1],
    );

    frame.render_widget(
        Paragraph::new(phase_strip(app.phase, app.failed_in)).alignment(Alignment::Right),
        chunks[2],
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepState {
    Pending,
    Active,
    Done,
    Failed,
}

const STEPS: [(TestPhase, &str); 3] = [
    (TestPhase::Ping, "ping"),
    (TestPhase::Download, "down"),
    (TestPhase::Upload, "up"),
];

fn step_index(phase: TestPhase) -> Option<usize> {
    STEPS.iter().position(|(p, _)| *p == phase)
}

fn step_state(step: usize, phase: TestPhase, failed_in: Option<TestPhase>) -> StepState {
    let current = match phase {
        TestPhase::Idle => return StepState::Pending,
        TestPhase::Completed => return StepState::Done,
        TestPhase::Failed => match failed_in.and_then(step_index) {
            Some(at) if at == step => return StepState::Failed,
            Some(at) => at,
            None => return StepState::Pending,
        },
        running => step_index(running).unwrap_or(0),
    };

    if step < current {
        StepState::Done
    } else if step == current && phase.is_running() {
        StepState::Active
    } else {
        StepState::Pending
    }
}

fn phase_strip(phase: TestPhase, failed_in: Option<TestPhase>) -> Line<'static> {
    let mut spans = Vec::new();

    for (i, (_, label)) in STEPS.iter().enumerate() {
        let style = match step_state(i, phase, failed_in) {
            StepState::Active => Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            StepState::Done => Style::default().fg(TEXT_SECONDARY),
            StepState::Failed => Style::default().fg(DANGER).add_modifier(Modifier::CROSSED_OUT),
            StepState::Pending => Style::default().fg(TEXT_MUTED),
        };
        if i > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(TEXT_MUTED)));
        }
        spans.push(Span::styled(*label, style));
    }

    Line::from(spans)
}

fn draw_gauge(frame: &mut Frame, area: Rect, app: &App) {
    let mut surface = RecordingSurface::new();
    app.gauge.draw(&app.settings.gauge, &mut surface);

    let side = app.gauge.side();
    let target = GaugeCanvas::fit(area, side);
    frame.render_widget(GaugeCanvas::new(surface.ops(), side), target);
}

fn draw_readouts(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(area);

    draw_metric(frame, rows[0], "Latency", WARN, app.latency_text());
    draw_metric(frame, rows[1], "Download", SUCCESS, app.download_text());
    draw_metric(frame, rows[2], "Upload", INFO, app.upload_text());
    draw_start_control(frame, rows[3], app);
}

fn draw_metric(frame: &mut Frame, area: Rect, title: &str, color: Color, value: String) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(format!(" {} ", title), Style::default().fg(color)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    frame.render_widget(
        Paragraph::new(value)
            .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_start_control(frame: &mut Frame, area: Rect, app: &App) {
    let (border, text) = if app.start_enabled {
        (ACCENT, TEXT_PRIMARY)
    } else {
        (BORDER, TEXT_MUTED)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    frame.render_widget(
        Paragraph::new(app.start_label)
            .style(Style::default().fg(text).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_progress_bar(frame: &mut Frame, area: Rect, percent: f64) {
    if area.width < 8 {
        return;
    }

    let label = format!(" {:>3.0}%", percent);
    let width = (area.width as usize).saturating_sub(label.len() + 2);
    let filled = ((percent / 100.0 * width as f64) as usize).min(width);
    let empty = width.saturating_sub(filled);

    let bar = Line::from(vec![
        Span::raw(" "),
        Span::styled("━".repeat(filled), Style::default().fg(ACCENT)),
        Span::styled("━".repeat(empty), Style::default().fg(BAR_DIM)),
        Span::styled(label, Style::default().fg(TEXT_SECONDARY)),
    ]);

    frame.render_widget(Paragraph::new(bar), area);
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.phase.is_running() {
        "testing · ctrl-c quit"
    } else {
        "enter start · q quit"
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::speedtest::TestUpdate;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw_ui(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn container_width_is_square_limited() {
        let area = Rect::new(0, 0, 120, 40);
        // Gauge region: 94 x 35 cells -> 188 dots wide, 140 dots tall.
        assert_eq!(gauge_container_width(area), 140);
    }

    #[test]
    fn idle_screen_shows_readouts() {
        let mut app = App::new(Settings::default());
        app.resize(gauge_container_width(Rect::new(0, 0, 100, 36)));
        let text = screen(&app, 100, 36);

        assert!(text.contains("Ready"));
        assert!(text.contains("0 ms"));
        assert!(text.contains("0.00 Mbps"));
        assert!(text.contains("Start Test"));
        assert!(text.contains("0.0"));
    }

    #[test]
    fn running_screen_tracks_updates() {
        let mut app = App::new(Settings::default());
        app.resize(gauge_container_width(Rect::new(0, 0, 100, 36)));
        app.begin_test();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.apply(TestUpdate::PingComplete {
            latency_ms: Some(31),
        });
        app.apply(TestUpdate::Phase(TestPhase::Download));

        let text = screen(&app, 100, 36);
        assert!(text.contains("Measuring Download Speed..."));
        assert!(text.contains("31 ms"));
        assert!(text.contains("Testing..."));
        assert!(text.contains("25%"));
    }

    #[test]
    fn phase_strip_marks_progress_and_failure() {
        let states = |phase, failed_in| -> Vec<StepState> {
            (0..STEPS.len())
                .map(|i| step_state(i, phase, failed_in))
                .collect()
        };

        assert_eq!(states(TestPhase::Idle, None), vec![StepState::Pending; 3]);
        assert_eq!(
            states(TestPhase::Download, None),
            vec![StepState::Done, StepState::Active, StepState::Pending]
        );
        assert_eq!(states(TestPhase::Completed, None), vec![StepState::Done; 3]);
        assert_eq!(
            states(TestPhase::Failed, Some(TestPhase::Upload)),
            vec![StepState::Done, StepState::Done, StepState::Failed]
        );
    }

    #[test]
    fn failed_run_shows_failure_in_header() {
        let mut app = App::new(Settings::default());
        app.resize(gauge_container_width(Rect::new(0, 0, 100, 36)));
        app.begin_test();
        app.apply(TestUpdate::Phase(TestPhase::Ping));
        app.apply(TestUpdate::Phase(TestPhase::Failed));
        assert_eq!(app.failed_in, Some(TestPhase::Ping));

        let text = screen(&app, 100, 36);
        assert!(text.contains("Test Failed - Please try again"));
        assert!(text.contains("ping › down › up"));
        assert!(text.contains("Start New Test"));
    }
}
