use rtrb::Consumer;

use crate::{
    dsp::delay::FeedbackDelay,
    synth::{
        message::{MessageReceiver, NoteEvent},
        params::ParamSnapshot,
        voice::{Voice, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

/*
Voice Pool
==========

A fixed set of voices, allocated once. Notes are addressed by frequency, not
by key number, and the pool remembers the *lead* voice: whichever voice the
most recent NoteOn landed on.

  NoteOn(f)       first Free voice, else steal (see below); becomes the lead
  NoteOff         release every held voice at the lead's frequency, then the
                  newest voice still held becomes the lead
  NoteRetune(f)   move the lead to f without retriggering
  AllNotesOff     release everything
  AllSoundOff     every voice to Idle, delay line cleared

Stealing
--------

    1. among Releasing voices, the quietest
    2. no voice releasing: the quietest overall
    3. equal levels: the oldest allocation

Quiet voices are the least audible to cut. A NoteOn is never dropped.

Short notes
-----------

Events are drained at the start of each block. A NoteOff arriving in the
same block as the NoteOn it ends would close the gate before a single
sample was rendered, so a release that follows a NoteOn in one drain is held
back and applied at the start of the next block. Draining stops there; later
events stay queued so nothing is reordered.
*/

pub struct PolySynth<R: MessageReceiver = Consumer<NoteEvent>> {
    voices: Vec<Voice>,
    rx: R,
    delay: FeedbackDelay,
    scratch: Vec<f32>,
    sample_rate: f32,
    next_age: u64,
    lead: Option<usize>,
    deferred: Option<NoteEvent>,
}

impl<R: MessageReceiver> PolySynth<R> {
    pub fn new(sample_rate: f32, max_voices: usize, max_delay_seconds: f32, rx: R) -> Self {
        let voices = (0..max_voices.max(1)).map(|_| Voice::new(sample_rate)).collect();

        Self {
            voices,
            rx,
            delay: FeedbackDelay::new(max_delay_seconds, sample_rate),
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            sample_rate,
            next_age: 0,
            lead: None,
            deferred: None,
        }
    }

    /// Drain pending events, then render `out` (mono).
    pub fn render_block(&mut self, params: &ParamSnapshot, out: &mut [f32]) {
        self.drain_events();

        let delay = params.delay();
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            chunk.fill(0.0);
            for voice in &mut self.voices {
                if voice.is_active() {
                    let scratch = &mut self.scratch[..chunk.len()];
                    voice.render(scratch, params);
                    for (o, v) in chunk.iter_mut().zip(scratch.iter()) {
                        *o += v;
                    }
                }
            }

            for sample in chunk.iter_mut() {
                let dry = *sample * params.master_volume;
                let dry = if dry.is_finite() { dry } else { 0.0 };
                *sample = sanitize(self.delay.next_sample(dry, &delay));
            }
        }
    }

    fn drain_events(&mut self) {
        let mut started = false;
        if let Some(event) = self.deferred.take() {
            self.handle_event(event);
        }

        while let Some(event) = self.rx.pop() {
            if started && event.is_release() {
                self.deferred = Some(event);
                break;
            }
            started |= matches!(event, NoteEvent::NoteOn { .. });
            self.handle_event(event);
        }
    }

    /// Apply one event immediately.
    pub fn handle_event(&mut self, event: NoteEvent) {
        match event {
            NoteEvent::NoteOn { frequency } => {
                let idx = self.allocate_voice();
                let age = self.next_age;
                self.next_age += 1;
                self.voices[idx].start(frequency, age);
                self.lead = Some(idx);
            }
            NoteEvent::NoteOff => {
                if let Some(lead) = self.lead.take() {
                    let frequency = self.voices[lead].frequency();
                    for voice in &mut self.voices {
                        if voice.is_held() && voice.frequency() == frequency {
                            voice.release();
                        }
                    }
                    self.lead = self.newest_held();
                }
            }
            NoteEvent::NoteRetune { frequency } => {
                if let Some(lead) = self.lead {
                    self.voices[lead].retune(frequency);
                }
            }
            NoteEvent::AllNotesOff => {
                for voice in &mut self.voices {
                    voice.release();
                }
                self.lead = None;
            }
            NoteEvent::AllSoundOff => self.silence(),
        }
    }

    /// Discard every pending event and silence the pool.
    pub fn flush(&mut self) {
        while self.rx.pop().is_some() {}
        self.silence();
    }

    fn silence(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.delay.reset();
        self.lead = None;
        self.deferred = None;
    }

    /// Most recently started voice whose gate is still high.
    fn newest_held(&self) -> Option<usize> {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_held())
            .max_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx)
    }

    fn allocate_voice(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return idx;
        }

        let quietest = |wanted: Option<VoiceState>| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| wanted.map_or(true, |state| v.state() == state))
                .min_by(|(_, a), (_, b)| {
                    a.level()
                        .total_cmp(&b.level())
                        .then(a.age().cmp(&b.age()))
                })
                .map(|(idx, _)| idx)
        };

        quietest(Some(VoiceState::Releasing))
            .or_else(|| quietest(None))
            .unwrap_or(0)
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

#[inline]
fn sanitize(sample: f32) -> f32 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::{Producer, RingBuffer};

    const SAMPLE_RATE: f32 = 48_000.0;
    const BLOCK: usize = 256;

    fn synth(voices: usize) -> (Producer<NoteEvent>, PolySynth) {
        let (tx, rx) = RingBuffer::new(64);
        (tx, PolySynth::new(SAMPLE_RATE, voices, 1.0, rx))
    }

    fn dry() -> ParamSnapshot {
        ParamSnapshot {
            delay_mix: 0.0,
            delay_feedback: 0.0,
            ..ParamSnapshot::default()
        }
    }

    fn run(synth: &mut PolySynth, params: &ParamSnapshot, blocks: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; BLOCK * blocks];
        for chunk in out.chunks_mut(BLOCK) {
            synth.render_block(params, chunk);
        }
        out
    }

    fn frequencies(synth: &PolySynth) -> Vec<f32> {
        synth
            .voices()
            .iter()
            .filter(|v| v.is_active())
            .map(|v| v.frequency())
            .collect()
    }

    #[test]
    fn silent_without_notes() {
        let (_tx, mut synth) = synth(4);
        let out = run(&mut synth, &ParamSnapshot::default(), 4);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn steals_quietest_voice_when_full() {
        let (mut tx, mut synth) = synth(4);
        let params = ParamSnapshot {
            attack: 1.0,
            ..dry()
        };

        // Each note gets one more block of attack than the next.
        for freq in [200.0, 300.0, 400.0, 500.0] {
            tx.push(NoteEvent::NoteOn { frequency: freq }).unwrap();
            run(&mut synth, &params, 1);
        }
        assert_eq!(synth.active_voice_count(), 4);

        tx.push(NoteEvent::NoteOn { frequency: 600.0 }).unwrap();
        run(&mut synth, &params, 1);

        let active = frequencies(&synth);
        assert_eq!(active.len(), 4);
        assert!(active.contains(&600.0));
        assert!(!active.contains(&500.0), "youngest (quietest) voice should go");
    }

    #[test]
    fn prefers_releasing_voice_when_stealing() {
        let (mut tx, mut synth) = synth(4);
        let fast = ParamSnapshot {
            attack: 0.01,
            decay: 0.01,
            sustain: 1.0,
            release: 10.0,
            ..dry()
        };
        tx.push(NoteEvent::NoteOn { frequency: 200.0 }).unwrap();
        run(&mut synth, &fast, 4);
        tx.push(NoteEvent::NoteOff).unwrap();
        run(&mut synth, &fast, 1);

        // Slow attacks keep the held voices well below the releasing one.
        let slow = ParamSnapshot { attack: 1.0, ..fast };
        for freq in [300.0, 400.0, 500.0] {
            tx.push(NoteEvent::NoteOn { frequency: freq }).unwrap();
            run(&mut synth, &slow, 1);
        }
        let releasing = &synth.voices()[0];
        assert_eq!(releasing.state(), VoiceState::Releasing);
        assert!(releasing.level() > 0.9);

        tx.push(NoteEvent::NoteOn { frequency: 600.0 }).unwrap();
        run(&mut synth, &slow, 1);

        let active = frequencies(&synth);
        assert_eq!(active.len(), 4);
        assert!(!active.contains(&200.0));
        assert!(active.contains(&300.0));
    }

    #[test]
    fn short_note_is_audible() {
        let (mut tx, mut synth) = synth(4);
        let params = dry();

        tx.push(NoteEvent::NoteOn { frequency: 440.0 }).unwrap();
        tx.push(NoteEvent::NoteOff).unwrap();

        let first = run(&mut synth, &params, 1);
        assert!(first.iter().any(|&s| s != 0.0), "note never sounded");
        assert_eq!(synth.voices()[0].state(), VoiceState::Active);

        run(&mut synth, &params, 1);
        assert_eq!(synth.voices()[0].state(), VoiceState::Releasing);
    }

    #[test]
    fn deferred_release_keeps_order() {
        let (mut tx, mut synth) = synth(4);
        let params = dry();

        tx.push(NoteEvent::NoteOn { frequency: 440.0 }).unwrap();
        tx.push(NoteEvent::NoteOff).unwrap();
        tx.push(NoteEvent::NoteOn { frequency: 550.0 }).unwrap();
        tx.push(NoteEvent::NoteOff).unwrap();

        run(&mut synth, &params, 1);
        assert_eq!(frequencies(&synth), vec![440.0]);

        // Second block: 440 released, 550 started, its release deferred.
        run(&mut synth, &params, 1);
        let states: Vec<_> = synth.voices()[..2].iter().map(|v| v.state()).collect();
        assert_eq!(states, vec![VoiceState::Releasing, VoiceState::Active]);

        run(&mut synth, &params, 1);
        assert_eq!(synth.voices()[1].state(), VoiceState::Releasing);
    }

    #[test]
    fn note_off_releases_lead_frequency() {
        let (mut tx, mut synth) = synth(4);
        let params = dry();

        for freq in [660.0, 440.0, 440.0] {
            tx.push(NoteEvent::NoteOn { frequency: freq }).unwrap();
            run(&mut synth, &params, 1);
        }
        tx.push(NoteEvent::NoteOff).unwrap();
        run(&mut synth, &params, 1);

        let voices = synth.voices();
        assert!(voices[0].is_held(), "660 Hz should still be held");
        assert_eq!(voices[1].state(), VoiceState::Releasing);
        assert_eq!(voices[2].state(), VoiceState::Releasing);

        // 660 Hz is the lead now; the next NoteOff releases it.
        tx.push(NoteEvent::NoteOff).unwrap();
        run(&mut synth, &params, 1);
        assert_eq!(synth.voices()[0].state(), VoiceState::Releasing);
    }

    #[test]
    fn overlapping_notes_release_newest_first() {
        let (mut tx, mut synth) = synth(4);
        let params = dry();

        tx.push(NoteEvent::NoteOn { frequency: 440.0 }).unwrap();
        run(&mut synth, &params, 1);
        tx.push(NoteEvent::NoteOn { frequency: 550.0 }).unwrap();
        run(&mut synth, &params, 1);

        tx.push(NoteEvent::NoteOff).unwrap();
        run(&mut synth, &params, 1);
        assert_eq!(frequencies(&synth), vec![440.0, 550.0]);
        assert!(synth.voices()[0].is_held(), "440 Hz should outlive the first NoteOff");
        assert_eq!(synth.voices()[1].state(), VoiceState::Releasing);

        // Retune follows the promoted note.
        tx.push(NoteEvent::NoteRetune { frequency: 330.0 }).unwrap();
        run(&mut synth, &params, 1);
        assert_eq!(synth.voices()[0].frequency(), 330.0);

        tx.push(NoteEvent::NoteOff).unwrap();
        run(&mut synth, &params, 8 * 48_000 / BLOCK);
        assert_eq!(synth.active_voice_count(), 0, "no voice may stick");
    }

    #[test]
    fn retune_glides_without_click() {
        let (mut tx, mut synth) = synth(2);
        let params = dry();

        tx.push(NoteEvent::NoteOn { frequency: 440.0 }).unwrap();
        let mut out = run(&mut synth, &params, 8);
        tx.push(NoteEvent::NoteRetune { frequency: 660.0 }).unwrap();
        out.extend(run(&mut synth, &params, 2));

        assert_eq!(frequencies(&synth), vec![660.0]);
        assert!(synth.voices()[0].is_held());

        let max_step = out.windows(2).map(|w| (w[1] - w[0]).abs()).fold(0.0f32, f32::max);
        assert!(max_step < 0.2, "discontinuity of {max_step}");
    }

    #[test]
    fn retune_without_lead_is_ignored() {
        let (mut tx, mut synth) = synth(2);
        tx.push(NoteEvent::NoteRetune { frequency: 660.0 }).unwrap();
        let out = run(&mut synth, &dry(), 1);
        assert_eq!(synth.active_voice_count(), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn output_is_clamped() {
        let (mut tx, mut synth) = synth(8);
        let params = ParamSnapshot {
            waveform: crate::Waveform::Square,
            master_volume: 1.0,
            filter_resonance: 0.95,
            delay_feedback: 0.95,
            delay_mix: 1.0,
            delay_time: 0.01,
            ..ParamSnapshot::default()
        };
        for n in 0..8 {
            tx.push(NoteEvent::NoteOn { frequency: 100.0 + n as f32 }).unwrap();
        }
        let out = run(&mut synth, &params, 40);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(out.iter().any(|s| s.abs() > 0.9));
    }

    #[test]
    fn all_sound_off_silences_voices_and_echoes() {
        let (mut tx, mut synth) = synth(4);
        let params = ParamSnapshot {
            delay_mix: 1.0,
            delay_feedback: 0.9,
            delay_time: 0.05,
            ..ParamSnapshot::default()
        };
        tx.push(NoteEvent::NoteOn { frequency: 440.0 }).unwrap();
        tx.push(NoteEvent::NoteOn { frequency: 550.0 }).unwrap();
        run(&mut synth, &params, 10);

        tx.push(NoteEvent::AllSoundOff).unwrap();
        let out = run(&mut synth, &params, 2);
        assert_eq!(synth.active_voice_count(), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn flush_discards_pending_events() {
        let (mut tx, mut synth) = synth(4);
        tx.push(NoteEvent::NoteOn { frequency: 440.0 }).unwrap();
        run(&mut synth, &dry(), 2);

        tx.push(NoteEvent::NoteOn { frequency: 550.0 }).unwrap();
        synth.flush();
        let out = run(&mut synth, &dry(), 2);
        assert_eq!(synth.active_voice_count(), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
