//! Parameter editor: one row per engine parameter, the selected one
//! highlighted.

use harphonium_dsp::{
    synth::{Param, ParamRange, SynthParams},
    ParamSnapshot,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const BAR_WIDTH: usize = 12;

/// Next value for `param` one step up or down. Times and the cutoff move
/// by ratio, everything else linearly.
pub fn nudge(param: Param, value: f32, up: bool) -> f32 {
    match param {
        Param::FilterCutoff => {
            if up {
                value * 1.12
            } else {
                value / 1.12
            }
        }
        Param::Attack | Param::Decay | Param::Release | Param::DelayTime => {
            if up {
                (value * 1.25).max(value + 0.01)
            } else {
                value / 1.25
            }
        }
        _ => {
            if up {
                value + 0.05
            } else {
                value - 0.05
            }
        }
    }
}

/// Position of a value within `range`, log scale for the cutoff.
fn fraction(param: Param, range: ParamRange, value: f32) -> f32 {
    let f = match param {
        Param::FilterCutoff => (value / range.min).ln() / (range.max / range.min).ln(),
        _ => (value - range.min) / (range.max - range.min),
    };
    f.clamp(0.0, 1.0)
}

fn format_value(param: Param, value: f32) -> String {
    match param {
        Param::FilterCutoff => format!("{value:>7.0} Hz"),
        Param::Attack | Param::Decay | Param::Release | Param::DelayTime => {
            format!("{value:>7.3} s ")
        }
        _ => format!("{value:>7.2}   "),
    }
}

pub fn render_params(
    frame: &mut Frame,
    area: Rect,
    params: &ParamSnapshot,
    store: &SynthParams,
    selected: Param,
) {
    let block = Block::default().title(" Parameters ").borders(Borders::ALL);

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:<17}", "waveform"), Style::default().fg(Color::Gray)),
        Span::styled(params.waveform.as_str(), Style::default().fg(Color::Cyan)),
    ])];

    for param in Param::ALL {
        let value = params.get(param);
        let filled = (fraction(param, store.range(param), value) * BAR_WIDTH as f32).round() as usize;
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));

        let style = if param == selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<17}", param.name()), style),
            Span::styled(format_value(param, value), Style::default().fg(Color::White)),
            Span::raw(" "),
            Span::styled(bar, Style::default().fg(Color::Blue)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
