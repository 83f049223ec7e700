mod atomic;

pub use atomic::AtomicF64;

use crate::core::voice::{Voice, VoiceKind};

/// Attenuation applied after the voice so summed harmonics do not clip.
pub const DEFAULT_MASTER_VOLUME: f64 = 0.4;

/// State shared between the control thread and the audio callback.
///
/// Wrap it in an `Arc`: the control thread calls [`set_frequency`],
/// [`note_on`] and [`note_off`]; the audio thread calls [`render`]. Every field
/// is an independent atomic, so neither side ever blocks the other.
///
/// [`set_frequency`]: SynthesisContext::set_frequency
/// [`note_on`]: SynthesisContext::note_on
/// [`note_off`]: SynthesisContext::note_off
/// [`render`]: SynthesisContext::render
#[derive(Debug)]
pub struct SynthesisContext {
    voice: Voice,
    frequency: AtomicF64,
    volume: AtomicF64,
    clock: AtomicF64,
}

impl SynthesisContext {
    pub fn new(voice: Voice) -> Self {
        Self {
            voice,
            frequency: AtomicF64::new(0.0),
            volume: AtomicF64::new(DEFAULT_MASTER_VOLUME),
            clock: AtomicF64::new(0.0),
        }
    }

    pub fn with_kind(kind: VoiceKind) -> Self {
        Self::new(Voice::new(kind))
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn frequency(&self) -> f64 {
        self.frequency.load()
    }

    pub fn set_frequency(&self, hertz: f64) {
        self.frequency.store(hertz);
    }

    pub fn volume(&self) -> f64 {
        self.volume.load()
    }

    pub fn set_volume(&self, volume: f64) {
        self.volume.store(volume.clamp(0.0, 1.0));
    }

    /// Playback time of the most recently rendered sample.
    pub fn time(&self) -> f64 {
        self.clock.load()
    }

    pub fn note_on(&self, time: f64) {
        self.voice.envelope.note_on(time);
    }

    pub fn note_off(&self, time: f64) {
        self.voice.envelope.note_off(time);
    }

    /// Produce one output sample for playback `time`.
    ///
    /// Called from the audio thread once per frame. No locks, no allocation.
    #[inline]
    pub fn render(&self, time: f64) -> f64 {
        self.clock.store(time);
        let sample = self.voice.sound(time, self.frequency.load());
        sample * self.volume.load()
    }
}
