//! Terminal UI for harphonium
//!
//! Draws a snapshot of the app each frame: status bar, parameter editor,
//! oscilloscope and spectrum.

pub mod params;
pub mod spectrum;
mod status;
mod waveform;

use harphonium_dsp::{
    io::cpal_output::StreamStatus,
    synth::{Param, SynthParams},
    ParamSnapshot,
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use params::render_params;
use spectrum::render_spectrum;
use status::render_status;
use waveform::render_scope;

const HELP: &str = " a-; play  space release  tab piano/glide  z/x octave  ,/. transpose  ←/→ bend  0 unbend  1-4 wave  ↑/↓ select  -/= adjust  bksp stop  q quit";

/// Everything one frame shows
pub struct UiState<'a> {
    pub params: ParamSnapshot,
    /// Live store, for ranges that depend on the engine.
    pub store: &'a SynthParams,
    pub selected: Param,
    pub scope: &'a [f32],
    pub spectrum: &'a [(f64, f64)],
    pub stream: StreamStatus,
    pub device: &'a str,
    pub sample_rate: f32,
    pub mode: &'static str,
    pub octave: i32,
    pub transpose: i32,
    pub bend_cents: f32,
    pub sounding: Option<f32>,
    pub notice: Option<&'a str>,
}

pub fn render(frame: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(14),   // Editor and views
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)])
        .split(rows[1]);

    let views = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[1]);

    render_status(frame, rows[0], state);
    render_params(frame, columns[0], &state.params, state.store, state.selected);
    render_scope(frame, views[0], state.scope);
    render_spectrum(frame, views[1], state.spectrum);

    let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}
