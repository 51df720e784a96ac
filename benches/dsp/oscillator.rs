//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use harphonium_dsp::dsp::{
    oscillator::{Oscillator, Waveform},
    RenderCtx,
};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // sine uses sin(), the rest are arithmetic and a branch
        for waveform in Waveform::ALL {
            let mut osc = Oscillator::new();
            group.bench_with_input(BenchmarkId::new(waveform.as_str(), size), &size, |b, _| {
                b.iter(|| {
                    osc.render(black_box(&mut buffer), waveform, black_box(&ctx));
                })
            });
        }
    }

    group.finish();
}
