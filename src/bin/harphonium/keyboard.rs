//! Computer keyboard to pitch mapping.
//!
//! Two rows of the keyboard form a piano octave and a bit:
//!
//!      w e   t y u   o p
//!     a s d f g h j k l ;
//!
//! `a` is C in the current octave. Pitches are plain frequencies, so
//! transpose and the fine bend can move them by any amount.

/// How a new key behaves while another is still sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Every key strikes a new note.
    Piano,
    /// Keys after the first slide the sounding note (fretless).
    Glide,
}

impl PlayMode {
    pub fn name(&self) -> &'static str {
        match self {
            PlayMode::Piano => "piano",
            PlayMode::Glide => "glide",
        }
    }
}

/// What the engine should be told.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteAction {
    On(f32),
    Retune(f32),
    Off,
}

const MIN_OCTAVE: i32 = 0;
const MAX_OCTAVE: i32 = 8;
const MAX_TRANSPOSE: i32 = 12;
const MAX_BEND_CENTS: f32 = 200.0;

/// Semitone above C for a key on the piano rows.
pub fn key_semitone(key: char) -> Option<i32> {
    let semitone = match key.to_ascii_lowercase() {
        'a' => 0,
        'w' => 1,
        's' => 2,
        'e' => 3,
        'd' => 4,
        'f' => 5,
        't' => 6,
        'g' => 7,
        'y' => 8,
        'h' => 9,
        'u' => 10,
        'j' => 11,
        'k' => 12,
        'o' => 13,
        'l' => 14,
        'p' => 15,
        ';' => 16,
        _ => return None,
    };
    Some(semitone)
}

/// Equal-tempered frequency of a MIDI-style pitch (69 = A4 = 440 Hz),
/// fractional pitches allowed.
pub fn pitch_to_hz(pitch: f32) -> f32 {
    440.0 * ((pitch - 69.0) / 12.0).exp2()
}

#[derive(Debug)]
pub struct Keyboard {
    mode: PlayMode,
    octave: i32,
    transpose: i32,
    bend_cents: f32,
    /// Key and semitone of the sounding note.
    held: Option<(char, i32)>,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            mode: PlayMode::Piano,
            octave: 4,
            transpose: 0,
            bend_cents: 0.0,
            held: None,
        }
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: char) -> Vec<NoteAction> {
        let Some(semitone) = key_semitone(key) else {
            return Vec::new();
        };
        let key = key.to_ascii_lowercase();
        let frequency = self.frequency(semitone);
        let previous = self.held.replace((key, semitone));

        match (self.mode, previous) {
            (_, None) => vec![NoteAction::On(frequency)],
            // key repeat of the sounding note
            (_, Some((prev, _))) if prev == key => Vec::new(),
            (PlayMode::Piano, Some(_)) => vec![NoteAction::Off, NoteAction::On(frequency)],
            (PlayMode::Glide, Some(_)) => vec![NoteAction::Retune(frequency)],
        }
    }

    /// Key-up, on terminals that report it.
    pub fn release(&mut self, key: char) -> Option<NoteAction> {
        let key = key.to_ascii_lowercase();
        match self.held {
            Some((held, _)) if held == key => {
                self.held = None;
                Some(NoteAction::Off)
            }
            _ => None,
        }
    }

    pub fn release_all(&mut self) -> Option<NoteAction> {
        self.held.take().map(|_| NoteAction::Off)
    }

    /// Nudge the fine tune; the sounding note follows.
    pub fn bend(&mut self, cents: f32) -> Option<NoteAction> {
        self.bend_cents = (self.bend_cents + cents).clamp(-MAX_BEND_CENTS, MAX_BEND_CENTS);
        self.retune_held()
    }

    pub fn reset_bend(&mut self) -> Option<NoteAction> {
        self.bend_cents = 0.0;
        self.retune_held()
    }

    pub fn shift_octave(&mut self, delta: i32) {
        self.octave = (self.octave + delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
    }

    pub fn shift_transpose(&mut self, delta: i32) {
        self.transpose = (self.transpose + delta).clamp(-MAX_TRANSPOSE, MAX_TRANSPOSE);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            PlayMode::Piano => PlayMode::Glide,
            PlayMode::Glide => PlayMode::Piano,
        };
    }

    pub fn frequency(&self, semitone: i32) -> f32 {
        let pitch = 12 * (self.octave + 1) + semitone + self.transpose;
        pitch_to_hz(pitch as f32 + self.bend_cents / 100.0)
    }

    /// Frequency of the sounding note, if any.
    pub fn sounding(&self) -> Option<f32> {
        self.held.map(|(_, semitone)| self.frequency(semitone))
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn transpose(&self) -> i32 {
        self.transpose
    }

    pub fn bend_cents(&self) -> f32 {
        self.bend_cents
    }

    fn retune_held(&self) -> Option<NoteAction> {
        self.sounding().map(NoteAction::Retune)
    }
}
