//! Benchmarks for a single voice chain: oscillator → envelope → filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use harphonium_dsp::{synth::Voice, ParamSnapshot, Waveform};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for waveform in [Waveform::Sine, Waveform::Sawtooth] {
            let params = ParamSnapshot {
                waveform,
                filter_cutoff: 2_500.0,
                ..ParamSnapshot::default()
            };
            let mut voice = Voice::new(48_000.0);
            voice.start(110.0, 0);

            group.bench_with_input(BenchmarkId::new(waveform.as_str(), size), &size, |b, _| {
                b.iter(|| {
                    voice.render(black_box(&mut buffer), black_box(&params));
                })
            });
        }
    }

    group.finish();
}
