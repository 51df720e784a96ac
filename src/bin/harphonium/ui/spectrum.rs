//! Spectrum view: Hann-windowed FFT read out at log-spaced frequencies.

use std::{f32::consts::PI, sync::Arc};

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const BANDS: usize = 48;
const FLOOR_DB: f64 = -100.0;
const LOWEST_HZ: f32 = 20.0;

pub struct Spectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin read for each band.
    bins: Vec<usize>,
    /// (frequency Hz, level dB) per band.
    bands: Vec<(f64, f64)>,
}

impl Spectrum {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);
        let window = (0..size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (size - 1) as f32).cos()))
            .collect();

        let top = (sample_rate / 2.0).min(20_000.0).max(LOWEST_HZ * 2.0);
        let span = (top / LOWEST_HZ) as f64;
        let last_bin = size / 2 - 1;
        let mut bins = Vec::with_capacity(BANDS);
        let mut bands = Vec::with_capacity(BANDS);
        for band in 0..BANDS {
            let hz = LOWEST_HZ as f64 * span.powf(band as f64 / (BANDS - 1) as f64);
            let bin = (hz * size as f64 / sample_rate as f64).round() as usize;
            bins.push(bin.min(last_bin));
            bands.push((hz, FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); size],
            bins,
            bands,
        }
    }

    /// Analyse one window of samples; other lengths are ignored.
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }
        for ((slot, &s), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (band, &bin) in self.bands.iter_mut().zip(&self.bins) {
            let power = self.scratch[bin].norm_sqr().max(1e-12) as f64;
            band.1 = (10.0 * power.log10()).max(FLOOR_DB);
        }
    }

    pub fn bands(&self) -> &[(f64, f64)] {
        &self.bands
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, bands: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(bands);

    let top_hz = bands.last().map_or(20_000.0, |(hz, _)| *hz);
    let top_db = bands.iter().map(|(_, db)| *db).fold(FLOOR_DB, f64::max);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, top_hz])
                .labels(vec!["0", "5k", "10k", "15k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, top_db.max(0.0) + 10.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
