//! harphonium - terminal keyboard synthesizer
//!
//! Run with: cargo run --features cpal
//! Logs go to the file named by HARPHONIUM_LOG (filtered by RUST_LOG).

mod app;
mod keyboard;
mod ui;

use std::sync::Mutex;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use harphonium_dsp::{EngineConfig, SynthHandle};
use tracing_subscriber::EnvFilter;

use app::App;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let (handle, renderer) = SynthHandle::new(EngineConfig::default());
    let app = App::new(handle, renderer).wrap_err("failed to start audio output")?;

    let mut terminal = ratatui::init();
    let res = app.run(&mut terminal);
    ratatui::restore();
    res
}

/// Log to a file so the terminal UI is left alone. Without HARPHONIUM_LOG
/// nothing is installed and the tracing macros are no-ops.
fn init_logging() -> EyreResult<()> {
    let Some(path) = std::env::var_os("HARPHONIUM_LOG") else {
        return Ok(());
    };
    let file = std::fs::File::create(&path)
        .wrap_err_with(|| format!("failed to create log file {}", path.to_string_lossy()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("starting harphonium");
    Ok(())
}
