use rtrb::Consumer;

/// Note events sent from the control thread to the audio thread.
///
/// Frequencies are in Hz: the keyboard computes pitch itself (including
/// microtonal transpose), so there are no note numbers here.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NoteEvent {
    /// Start a note; becomes the lead voice.
    NoteOn { frequency: f32 },
    /// Release every held voice sounding the lead voice's frequency.
    NoteOff,
    /// Glide the lead voice to a new frequency without retriggering.
    NoteRetune { frequency: f32 },
    /// Release every sounding voice.
    AllNotesOff,
    /// Silence immediately: all voices to idle, echoes cleared.
    AllSoundOff,
}

impl NoteEvent {
    /// Short name used in logs and queue-full reports.
    pub fn name(&self) -> &'static str {
        match self {
            NoteEvent::NoteOn { .. } => "note_on",
            NoteEvent::NoteOff => "note_off",
            NoteEvent::NoteRetune { .. } => "note_retune",
            NoteEvent::AllNotesOff => "all_notes_off",
            NoteEvent::AllSoundOff => "all_sound_off",
        }
    }

    /// Events that end a gate; these wait a block after a note start.
    pub(crate) fn is_release(&self) -> bool {
        matches!(self, NoteEvent::NoteOff | NoteEvent::AllNotesOff)
    }
}

/// Source of note events drained by the voice pool on the audio thread.
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<NoteEvent>;
}

impl MessageReceiver for Consumer<NoteEvent> {
    fn pop(&mut self) -> Option<NoteEvent> {
        Consumer::pop(self).ok()
    }
}
