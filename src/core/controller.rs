use std::sync::Arc;
use log::{debug, warn};
use crate::core::oscillator::{note_frequency, NOTE_COUNT};
use crate::core::synth::SynthesisContext;

/// Turns key transitions into frequency changes and envelope triggers.
///
/// Monophonic with last-note priority: the most recently pressed key sounds.
/// Releasing it falls back to the newest key that is still held.
pub struct NoteController {
    context: Arc<SynthesisContext>,
    held: Vec<usize>,
}

impl NoteController {
    pub fn new(context: Arc<SynthesisContext>) -> Self {
        Self {
            context,
            held: Vec::with_capacity(NOTE_COUNT),
        }
    }

    /// The note index currently sounding, if any.
    pub fn current(&self) -> Option<usize> {
        self.held.last().copied()
    }

    pub fn context(&self) -> &Arc<SynthesisContext> {
        &self.context
    }

    /// Handle a key going down at `time`. Returns false for an index outside the layout.
    pub fn key_down(&mut self, index: usize, time: f64) -> bool {
        let Some(frequency) = note_frequency(index) else {
            warn!("Ignoring key down for note {} outside the {}-note layout", index, NOTE_COUNT);
            return false;
        };

        if self.current() == Some(index) {
            return true;
        }

        self.held.retain(|&held| held != index);
        self.held.push(index);
        self.trigger(index, frequency, time);
        true
    }

    /// Handle a key going up at `time`. Returns false for an index outside the layout.
    pub fn key_up(&mut self, index: usize, time: f64) -> bool {
        if index >= NOTE_COUNT {
            warn!("Ignoring key up for note {} outside the {}-note layout", index, NOTE_COUNT);
            return false;
        }

        let was_current = self.current() == Some(index);
        self.held.retain(|&held| held != index);

        if !was_current {
            return true;
        }

        match self.current() {
            Some(previous) => {
                if let Some(frequency) = note_frequency(previous) {
                    self.trigger(previous, frequency, time);
                }
            },
            None => {
                debug!("Note off at {:.4}s", time);
                self.context.note_off(time);
            },
        }
        true
    }

    /// Release everything, e.g. when input focus is lost.
    pub fn all_notes_off(&mut self, time: f64) {
        if !self.held.is_empty() {
            self.held.clear();
            self.context.note_off(time);
        }
    }

    fn trigger(&self, index: usize, frequency: f64, time: f64) {
        debug!("Note {} on at {:.4}s ({:.2} Hz)", index, time, frequency);
        self.context.set_frequency(frequency);
        self.context.note_on(time);
    }
}
