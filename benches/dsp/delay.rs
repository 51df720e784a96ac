//! Benchmarks for the feedback delay and its delay line.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use harphonium_dsp::dsp::delay::{DelayLine, DelayParams, FeedbackDelay};

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in seconds
    let delay_times: &[f32] = &[0.01, 0.1, 1.0];

    for &size in BLOCK_SIZES {
        // Generate a test signal
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &time in delay_times {
            let params = DelayParams::new(time, 0.5, 0.3);
            let mut delay = FeedbackDelay::new(2.0, 48_000.0);
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("feedback_{}ms", (time * 1000.0) as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        delay.render(black_box(&mut buffer), black_box(&params));
                    })
                },
            );
        }

        // Interpolated read with a moving read head
        let mut line = DelayLine::with_max_time(0.1, 48_000.0);
        for &sample in &input {
            line.write(sample);
        }
        group.bench_with_input(BenchmarkId::new("read_interpolated", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..size {
                    let delay_time = 480.0 + (i as f32 * 0.1).sin() * 48.0;
                    sum += line.read_interpolated(black_box(delay_time));
                }
                sum
            })
        });
    }

    group.finish();
}
