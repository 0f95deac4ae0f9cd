mod app;
mod cli;
mod gauge;
mod headless;
mod settings;
mod speedtest;
mod ui;

use anyhow::Result;
use app::{poll_event, App, AppAction};
use clap::Parser;
use cli::Cli;
use crossterm::event::Event;
use ratatui::{layout::Rect, DefaultTerminal};
use settings::Settings;
use speedtest::clock::SystemClock;
use speedtest::transport::HttpTransport;
use speedtest::{Sampler, TestUpdate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use ui::{draw_ui, gauge_container_width};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_tracing()?;

    let settings = Settings::default();

    if cli.headless {
        let sampler = new_sampler(&settings)?;
        let app = App::new(settings);
        return headless::run_headless(app, sampler, &mut std::io::stdout()).await;
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run_app(&mut terminal, settings).await;

    ratatui::restore();
    result
}

fn new_sampler(settings: &Settings) -> Result<Sampler> {
    let transport = HttpTransport::new()?;
    Ok(Sampler::new(
        settings.clone(),
        Arc::new(transport),
        Arc::new(SystemClock::new()),
    ))
}

async fn run_app(terminal: &mut DefaultTerminal, settings: Settings) -> Result<()> {
    let mut app = App::new(settings);
    let mut test_rx: Option<mpsc::Receiver<TestUpdate>> = None;

    let size = terminal.size()?;
    app.resize(gauge_container_width(Rect::new(0, 0, size.width, size.height)));

    loop {
        terminal.draw(|frame| draw_ui(frame, &app))?;

        // Drain everything the sampler produced since the last frame.
        if let Some(rx) = test_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(update) => app.apply(update),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        app.sampler_gone();
                        test_rx = None;
                        break;
                    }
                }
            }
        }

        match poll_event(Duration::from_millis(30))? {
            Some(Event::Key(key)) => match app.handle_key_event(key) {
                Some(AppAction::Quit) => break,
                Some(AppAction::StartTest) => {
                    app.begin_test();
                    let (tx, rx) = mpsc::channel(64);
                    test_rx = Some(rx);

                    match new_sampler(&app.settings) {
                        Ok(mut sampler) => {
                            info!("starting speed test");
                            tokio::spawn(async move {
                                let _ = sampler.run_full_test(tx).await;
                            });
                        }
                        // Dropping `tx` here disconnects the channel, which
                        // fails the run on the next frame.
                        Err(err) => tracing::error!(error = %err, "could not start speed test"),
                    }
                }
                None => {}
            },
            Some(Event::Resize(width, height)) => {
                app.resize(gauge_container_width(Rect::new(0, 0, width, height)));
            }
            _ => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
