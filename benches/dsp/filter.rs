//! Benchmarks for the state-variable low-pass filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use harphonium_dsp::dsp::{filter::SVFilter, RenderCtx};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0);

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        for (name, resonance) in [("lowpass", 0.1), ("lowpass_resonant", 0.9)] {
            let mut filter = SVFilter::lowpass(1000.0).with_resonance(resonance);
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }
    }

    group.finish();
}
