//! Benchmarks for the full engine: every voice sounding, delay on.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use harphonium_dsp::{AudioRenderer, EngineConfig, SynthHandle, Waveform};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for polyphony in [1usize, 8] {
            let (mut handle, mut renderer) =
                SynthHandle::new(EngineConfig::default().polyphony(polyphony));
            handle.set_waveform(Waveform::Sawtooth);
            handle.set_filter_cutoff(3_000.0);
            handle.set_sustain(1.0);
            for n in 0..polyphony {
                let _ = handle.note_on(110.0 * (n + 1) as f32);
            }

            group.bench_with_input(
                BenchmarkId::new(format!("voices_{polyphony}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        renderer.render(black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}
