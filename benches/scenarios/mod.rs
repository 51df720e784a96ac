//! Real-world scenario benchmarks.
//!
//! A single voice chain as the pool runs it, and the whole engine with the
//! pool full.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
