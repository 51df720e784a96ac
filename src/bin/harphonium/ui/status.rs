//! Status bar - stream health, play mode, pitch and output levels

use harphonium_dsp::io::cpal_output::StreamStatus;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::UiState;

/// Output level of the visible window
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_status(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().title(" harphonium ").borders(Borders::ALL);
    let stats = AudioStats::from_buffer(state.scope);

    let (stream_label, stream_color) = match state.stream {
        StreamStatus::Running => ("● running", Color::Green),
        StreamStatus::Disconnected => ("○ disconnected", Color::Yellow),
        StreamStatus::Failed => ("✕ failed", Color::Red),
    };
    let note = match state.sounding {
        Some(hz) => format!("{hz:7.2} Hz"),
        None => "   --     ".to_string(),
    };

    let mut spans = vec![
        Span::styled(format!(" {stream_label}  "), Style::default().fg(stream_color)),
        Span::styled(
            format!("{}  {:.1}kHz  ", state.device, state.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("{}  oct {}  trn {:+}  bend {:+.0}c  ", state.mode, state.octave, state.transpose, state.bend_cents),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{note}  "), Style::default().fg(Color::White)),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if let Some(notice) = state.notice {
        spans.push(Span::styled(format!("  {notice}"), Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_full_scale_square() {
        let stats = AudioStats::from_buffer(&[1.0, -1.0, 1.0, -1.0]);
        assert_eq!(stats.peak, 1.0);
        assert!((stats.rms - 1.0).abs() < 1e-6);
        assert_eq!(AudioStats::from_buffer(&[]).rms, 0.0);
    }
}
