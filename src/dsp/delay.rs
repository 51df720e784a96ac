/*
Feedback Delay
==============

An echo: the mixed output of all voices is written into a ring buffer and
read back `time` seconds later.

    ┌─────────────────────────────────────────────┐
    │                                             │
    input ──┬────────────────────────(+)──→ output │
            │                         ↑            │
            │                       × mix          │
            ↓                         │            │
           (+) ──→ [ ring buffer ] ───┴──→ × feedback
            ↑                                  │
            └──────────────────────────────────┘

Per sample:

    delayed = buffer[write_pos - time·sample_rate]     (linear interpolation)
    output  = input + delayed · mix
    buffer[write_pos] = input + delayed · feedback

Every trip around the loop multiplies an echo by `feedback`. Feedback is
clamped below 1.0 (to 0.95), so each repeat is quieter than the one before
and the tail always dies out.

The ring buffer is allocated once, sized for the longest supported delay, and
never grows. Moving the delay time glides the read head instead of jumping,
which avoids clicks while a slider is dragged.
*/

/// Highest accepted feedback; keeps every repeat quieter than the last.
pub const MAX_FEEDBACK: f32 = 0.95;

/// Per-sample smoothing of the read head when the delay time changes.
const TIME_SMOOTHING: f32 = 0.001;

/// Delay effect settings, time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    pub time: f32,
    pub feedback: f32,
    pub mix: f32,
}

impl DelayParams {
    pub fn new(time: f32, feedback: f32, mix: f32) -> Self {
        Self {
            time: time.max(0.0),
            feedback: feedback.clamp(0.0, MAX_FEEDBACK),
            mix: mix.clamp(0.0, 1.0),
        }
    }
}

impl Default for DelayParams {
    fn default() -> Self {
        Self::new(0.3, 0.3, 0.3)
    }
}

/// Fixed-capacity circular buffer with fractional reads.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Allocate a line able to hold `capacity` past samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2)],
            write_pos: 0,
        }
    }

    /// Allocate a line long enough for `seconds` of delay.
    pub fn with_max_time(seconds: f32, sample_rate: f32) -> Self {
        let samples = (seconds.max(0.0) * sample_rate).ceil() as usize;
        Self::new(samples + 2)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest delay, in samples, that can be read back.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 2
    }

    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Sample written `delay` writes ago (1 = most recent).
    #[inline]
    fn tap(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        self.buffer[(self.write_pos + len - delay) % len]
    }

    /// Read with linear interpolation between neighbouring samples.
    /// `delay_samples` is clamped to [1, max_delay].
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let max = self.max_delay().max(1) as f32;
        let delay = if delay_samples.is_finite() {
            delay_samples.clamp(1.0, max)
        } else {
            1.0
        };
        let whole = delay.floor();
        let frac = delay - whole;
        let a = self.tap(whole as usize);
        let b = self.tap(whole as usize + 1);
        a + (b - a) * frac
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Feedback echo applied to the mixed output.
pub struct FeedbackDelay {
    line: DelayLine,
    sample_rate: f32,
    /// Read head position in samples; `None` until the first sample so the
    /// initial setting is taken without a glide.
    current_delay: Option<f32>,
}

impl FeedbackDelay {
    pub fn new(max_seconds: f32, sample_rate: f32) -> Self {
        Self {
            line: DelayLine::with_max_time(max_seconds, sample_rate),
            sample_rate,
            current_delay: None,
        }
    }

    /// Longest supported delay in seconds.
    pub fn max_time(&self) -> f32 {
        self.line.max_delay() as f32 / self.sample_rate
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32, params: &DelayParams) -> f32 {
        let max = (self.line.max_delay() as f32).max(1.0);
        let target = (params.time * self.sample_rate).clamp(1.0, max);
        let delay = match self.current_delay {
            Some(current) => current + (target - current) * TIME_SMOOTHING,
            None => target,
        };
        self.current_delay = Some(delay);

        let feedback = params.feedback.clamp(0.0, MAX_FEEDBACK);
        let delayed = self.line.read_interpolated(delay);
        self.line.write(input + delayed * feedback);
        input + delayed * params.mix
    }

    pub fn render(&mut self, buffer: &mut [f32], params: &DelayParams) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, params);
        }
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.current_delay = None;
    }
}
