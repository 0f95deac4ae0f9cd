use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Terminal speed test with an analog gauge", long_about = None)]
pub struct Cli {
    /// Print readings line by line instead of drawing the gauge
    #[arg(long, action = ArgAction::SetTrue)]
    pub headless: bool,

    /// Write log output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

impl Cli {
    fn default_directive(&self) -> &'static str {
        if self.verbose {
            "gaugespeed=debug"
        } else {
            "gaugespeed=info"
        }
    }

    pub fn init_tracing(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()));

        match &self.log_file {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create log file {}", path.display()))?;
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .try_init()
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            None if self.headless => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .try_init()
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            None => {}
        }

        Ok(())
    }
}
