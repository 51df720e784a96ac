use crate::{dsp::RenderCtx, MIN_TIME};

/*
ADSR Envelope Implementation
============================

A linear ADSR envelope generator: the amplitude shape of every voice.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0). This multiplies
              the oscillator output to control its amplitude over time.

  stage       Which phase of the envelope we're in: Idle, Attack, Decay,
              Sustain, or Release. A state machine governs transitions.

  gate        The note on/off signal. Gate high (note_on) triggers Attack.
              Gate low (note_off) triggers Release from wherever we are.

  elapsed     Samples spent in the current ramp. Every ramp is a straight line
              from a start level to an end level over a number of samples,
              so the level is recomputed from `elapsed` rather than by adding
              increments (no drift, ramps land exactly on their target).


The Shape: Linear Ramps
-----------------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release
         (A)   (D)      (S)      (R)


The State Machine
-----------------

    ┌──────┐  note_on   ┌────────┐  level=1   ┌───────┐
    │ Idle │ ─────────→ │ Attack │ ─────────→ │ Decay │
    └──────┘            └────────┘            └───────┘
        ↑                  ↑   │ note_off         │ level=S
        │          note_on │   ↓                  ↓
        │   level=0   ┌─────────┐  note_off  ┌─────────┐
        └──────────── │ Release │ ←───────── │ Sustain │
                      └─────────┘            └─────────┘

  - note_on from ANY stage restarts Attack from the CURRENT level. A
    retriggered note never snaps to zero, so there is no click.
  - note_off from ANY stage starts Release from the CURRENT level.


Release Timing
--------------

Release is scaled by how much level is left to lose:

    release_seconds = release · L / max(L, sustain)

Released at or above the sustain level, the ramp takes exactly `release`.
Released early in the attack (L below sustain) the ramp is shortened in
proportion, so it never falls slower than a normal release would and always
reaches zero within `release` seconds.

Parameters are pushed in once per block with `set_params`, not per sample.
*/

/// Level under which a releasing envelope is considered silent.
pub const SILENCE_THRESHOLD: f32 = 1e-4;

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Gate high, ramping up to 1.0
    Decay,   // Reached peak, ramping down to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

/// Per-stage runtime state, carrying the ramp bookkeeping for that stage.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack { from: f32, elapsed: u32 },
    Decay { elapsed: u32 },
    Sustain,
    Release { from: f32, elapsed: u32, total: u32 },
}

/// ADSR shape, times in seconds and sustain as a level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl AdsrParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(MIN_TIME),
            decay: decay.max(MIN_TIME),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(MIN_TIME),
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self::new(0.02, 0.2, 0.6, 0.3)
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    params: AdsrParams,
    stage: Stage,
    level: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl Envelope {
    pub fn new() -> Self {
        Self::with_params(AdsrParams::default())
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self::with_params(AdsrParams::new(attack, decay, sustain, release))
    }

    pub fn with_params(params: AdsrParams) -> Self {
        Self {
            params: AdsrParams::new(params.attack, params.decay, params.sustain, params.release),
            stage: Stage::Idle,
            level: 0.0,
        }
    }

    /// Replace the shape. Takes effect on the next sample; a release already
    /// in flight keeps the length it was given at note_off.
    pub fn set_params(&mut self, params: AdsrParams) {
        self.params = AdsrParams::new(params.attack, params.decay, params.sustain, params.release);
    }

    pub fn params(&self) -> AdsrParams {
        self.params
    }

    /// Gate high: ramp from the current level up to 1.0.
    pub fn note_on(&mut self) {
        self.stage = Stage::Attack {
            from: self.level,
            elapsed: 0,
        };
    }

    /// Gate low: start the release phase from the current level.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        if matches!(self.stage, Stage::Idle | Stage::Release { .. }) {
            return;
        }

        let from = self.level;
        if from < SILENCE_THRESHOLD {
            self.reset();
            return;
        }

        let scale = from / from.max(self.params.sustain);
        let total = to_samples(self.params.release * scale, ctx.sample_rate);
        self.stage = Stage::Release {
            from,
            elapsed: 0,
            total,
        };
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }

            Stage::Attack { from, elapsed } => {
                let elapsed = elapsed.saturating_add(1);
                let total = to_samples(self.params.attack, ctx.sample_rate);
                if elapsed >= total {
                    self.level = 1.0;
                    self.stage = Stage::Decay { elapsed: 0 };
                } else {
                    self.level = from + (1.0 - from) * ramp(elapsed, total);
                    self.stage = Stage::Attack { from, elapsed };
                }
            }

            Stage::Decay { elapsed } => {
                let elapsed = elapsed.saturating_add(1);
                let total = to_samples(self.params.decay, ctx.sample_rate);
                let sustain = self.params.sustain;
                if elapsed >= total {
                    self.level = sustain;
                    self.stage = Stage::Sustain;
                } else {
                    self.level = 1.0 - (1.0 - sustain) * ramp(elapsed, total);
                    self.stage = Stage::Decay { elapsed };
                }
            }

            Stage::Sustain => {
                self.level = self.params.sustain;
            }

            Stage::Release {
                from,
                elapsed,
                total,
            } => {
                let elapsed = elapsed.saturating_add(1);
                self.level = (from * (1.0 - ramp(elapsed, total))).max(0.0);
                if elapsed >= total || self.level < SILENCE_THRESHOLD {
                    self.reset();
                } else {
                    self.stage = Stage::Release {
                        from,
                        elapsed,
                        total,
                    };
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, Stage::Idle)
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.level = 0.0;
    }

    /// Get the current envelope level (0.0 to 1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Get the current envelope stage
    pub fn state(&self) -> EnvelopeState {
        match self.stage {
            Stage::Idle => EnvelopeState::Idle,
            Stage::Attack { .. } => EnvelopeState::Attack,
            Stage::Decay { .. } => EnvelopeState::Decay,
            Stage::Sustain => EnvelopeState::Sustain,
            Stage::Release { .. } => EnvelopeState::Release,
        }
    }
}

#[inline]
fn to_samples(seconds: f32, sample_rate: f32) -> u32 {
    (seconds * sample_rate).round().max(1.0) as u32
}

#[inline]
fn ramp(elapsed: u32, total: u32) -> f32 {
    (elapsed as f32 / total as f32).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0)
    }

    fn render_samples(env: &mut Envelope, samples: usize) -> Vec<f32> {
        let ctx = ctx();
        (0..samples).map(|_| env.next_sample(&ctx)).collect()
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2);

        env.note_on();
        render_samples(&mut env, (0.01 * SAMPLE_RATE) as usize);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_eq!(env.state(), EnvelopeState::Decay);
    }

    #[test]
    fn sustain_holds_target_level() {
        let sustain = 0.6;
        let mut env = Envelope::adsr(0.01, 0.05, sustain, 0.2);

        env.note_on();
        let attack_decay_samples = ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5;
        render_samples(&mut env, attack_decay_samples);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - sustain).abs() < 1e-6, "sustain level should be held");
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, release);

        env.note_on();
        render_samples(&mut env, (0.02 * SAMPLE_RATE) as usize);

        env.note_off(&ctx());
        render_samples(&mut env, (release * SAMPLE_RATE) as usize + 2);

        assert!(env.level() <= 0.001, "release should fall back to zero");
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert!(!env.is_active());
    }

    #[test]
    fn release_is_monotonic_from_every_stage() {
        // Release after 3 ms (attack), 20 ms (decay) and 200 ms (sustain).
        for &held in &[3usize, 20, 200] {
            let mut env = Envelope::adsr(0.01, 0.05, 0.5, 0.1);
            env.note_on();
            render_samples(&mut env, held);
            env.note_off(&ctx());

            let tail = render_samples(&mut env, (0.1 * SAMPLE_RATE) as usize + 1);
            for w in tail.windows(2) {
                assert!(w[1] <= w[0], "release rose after {held} ms: {w:?}");
            }
            assert_eq!(env.state(), EnvelopeState::Idle, "not idle after {held} ms");
        }
    }

    #[test]
    fn release_below_sustain_is_shortened() {
        let mut env = Envelope::adsr(0.1, 0.05, 0.8, 0.1);
        env.note_on();
        // 20 of 100 attack samples -> level 0.2, a quarter of sustain
        render_samples(&mut env, 20);
        assert!((env.level() - 0.2).abs() < 1e-4);

        env.note_off(&ctx());
        render_samples(&mut env, 25);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn retrigger_starts_from_current_level() {
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, 0.1);
        env.note_on();
        render_samples(&mut env, 200);
        env.note_off(&ctx());
        render_samples(&mut env, 20);
        let before = env.level();
        assert!(before > 0.1 && before < 0.5);

        env.note_on();
        let first = env.next_sample(&ctx());
        assert_eq!(env.state(), EnvelopeState::Attack);
        assert!(first >= before, "retrigger dropped from {before} to {first}");
        assert!(first - before < 0.1, "retrigger jumped from {before} to {first}");
    }

    #[test]
    fn params_apply_between_blocks() {
        let mut env = Envelope::adsr(0.01, 0.01, 0.5, 0.1);
        env.note_on();
        render_samples(&mut env, 50);
        assert!((env.level() - 0.5).abs() < 1e-6);

        env.set_params(AdsrParams::new(0.01, 0.01, 0.9, 0.1));
        render_samples(&mut env, 1);
        assert!((env.level() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn note_off_while_idle_is_ignored() {
        let mut env = Envelope::new();
        env.note_off(&ctx());
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.next_sample(&ctx()), 0.0);
    }
}
