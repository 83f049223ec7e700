use serde::{Serialize, Deserialize};
use crate::core::oscillator::{Envelope, EnvelopeConfig, OscillatorRequest, Waveform};

/// The instrument timbres the synth can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VoiceKind {
    /// Sustained reedy voice with vibrato and breath noise
    #[default]
    Harmonica,
    /// Percussive voice that decays to silence while held
    Bell,
    /// Slow-attack saw pad with detuned beating
    Strings,
}

/// One oscillator in a voice, tuned relative to the played note.
///
/// `template.frequency` is a multiplier of the base frequency, not Hz. A
/// multiplier of 0 keeps the partial untuned (used for noise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub template: OscillatorRequest,
    pub weight: f64,
}

impl Partial {
    pub fn new(multiplier: f64, waveform: Waveform, weight: f64) -> Self {
        Self {
            template: OscillatorRequest::new(multiplier, waveform),
            weight,
        }
    }

    pub fn with_vibrato(mut self, depth: f64, rate: f64) -> Self {
        self.template = self.template.with_vibrato(depth, rate);
        self
    }

    #[inline]
    fn sample(&self, time: f64, base_frequency: f64) -> f64 {
        let request = OscillatorRequest {
            frequency: self.template.frequency * base_frequency,
            ..self.template
        };
        self.weight * request.sample(time)
    }
}

/// An envelope plus a fixed weighted mix of oscillators.
#[derive(Debug)]
pub struct Voice {
    kind: VoiceKind,
    pub envelope: Envelope,
    partials: Vec<Partial>,
}

impl Voice {
    pub fn new(kind: VoiceKind) -> Self {
        match kind {
            VoiceKind::Harmonica => Self::harmonica(),
            VoiceKind::Bell => Self::bell(),
            VoiceKind::Strings => Self::strings(),
        }
    }

    /// Build a custom voice. Used for the built-in kinds and by tests.
    pub fn from_parts(kind: VoiceKind, envelope: EnvelopeConfig, partials: Vec<Partial>) -> Self {
        Self {
            kind,
            envelope: Envelope::new(envelope),
            partials,
        }
    }

    pub fn harmonica() -> Self {
        let envelope = EnvelopeConfig {
            attack: 0.10,
            decay: 0.05,
            release: 0.40,
            sustain: 0.8,
            start: 1.0,
        };
        Self::from_parts(VoiceKind::Harmonica, envelope, vec![
            Partial::new(1.0, Waveform::Sine, 1.0).with_vibrato(0.001, 5.0),
            Partial::new(1.5, Waveform::Square, 0.25),
            Partial::new(2.0, Waveform::Sine, 0.25),
            Partial::new(0.0, Waveform::Noise, 0.05),
        ])
    }

    pub fn bell() -> Self {
        let envelope = EnvelopeConfig {
            attack: 0.0,
            decay: 1.0,
            release: 1.0,
            sustain: 0.0,
            start: 1.0,
        };
        Self::from_parts(VoiceKind::Bell, envelope, vec![
            Partial::new(1.0, Waveform::Sine, 1.0).with_vibrato(0.001, 5.0),
            Partial::new(2.0, Waveform::Sine, 0.5),
            Partial::new(3.0, Waveform::Sine, 0.25),
        ])
    }

    pub fn strings() -> Self {
        let envelope = EnvelopeConfig {
            attack: 0.30,
            decay: 0.20,
            release: 0.60,
            sustain: 0.7,
            start: 0.9,
        };
        Self::from_parts(VoiceKind::Strings, envelope, vec![
            Partial::new(1.0, Waveform::AnalogSaw, 0.6).with_vibrato(0.0005, 6.0),
            Partial::new(1.003, Waveform::DigitalSaw, 0.3),
            Partial::new(2.0, Waveform::Triangle, 0.2),
        ])
    }

    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    /// Sample at `time` for a note at `base_frequency`, in [-1, 1].
    ///
    /// Does not allocate. The envelope is read first so a silent voice skips
    /// the oscillators entirely.
    pub fn sound(&self, time: f64, base_frequency: f64) -> f64 {
        let amplitude = self.envelope.amplitude(time);
        if amplitude == 0.0 {
            return 0.0;
        }

        let mix: f64 = self.partials
            .iter()
            .map(|partial| partial.sample(time, base_frequency))
            .sum();

        (amplitude * mix).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_triggered() {
        for kind in [VoiceKind::Harmonica, VoiceKind::Bell, VoiceKind::Strings] {
            let voice = Voice::new(kind);
            assert_eq!(voice.kind(), kind);
            for step in 0..100 {
                assert_eq!(voice.sound(step as f64 * 0.01, 220.0), 0.0);
            }
        }
    }

    #[test]
    fn output_is_clamped() {
        for kind in [VoiceKind::Harmonica, VoiceKind::Bell, VoiceKind::Strings] {
            let voice = Voice::new(kind);
            voice.envelope.note_on(0.0);
            for step in 0..20_000 {
                let value = voice.sound(step as f64 / 44_100.0, 146.83);
                assert!((-1.0..=1.0).contains(&value), "{kind:?} gave {value}");
            }
        }
    }

    #[test]
    fn output_is_envelope_times_weighted_mix() {
        let envelope = EnvelopeConfig {
            attack: 0.0,
            decay: 0.0,
            release: 0.1,
            sustain: 0.5,
            start: 1.0,
        };
        let voice = Voice::from_parts(VoiceKind::Bell, envelope, vec![
            Partial::new(1.0, Waveform::Sine, 0.5),
            Partial::new(2.0, Waveform::Sine, 0.25),
        ]);
        voice.envelope.note_on(0.0);

        let time = 0.001_3;
        let base = 200.0;
        let expected = 0.5
            * (0.5 * (std::f64::consts::TAU * base * time).sin()
                + 0.25 * (std::f64::consts::TAU * 2.0 * base * time).sin());
        assert!((voice.sound(time, base) - expected).abs() < 1e-12);
    }

    #[test]
    fn bell_rings_out_while_held() {
        let voice = Voice::bell();
        voice.envelope.note_on(0.0);

        assert!(voice.sound(0.001, 220.0).abs() > 0.0);
        assert_eq!(voice.envelope.amplitude(1.0), 0.0);
        for step in 0..100 {
            assert_eq!(voice.sound(1.0 + step as f64 * 0.01, 220.0), 0.0);
        }
    }

    #[test]
    fn harmonica_sustains_until_released() {
        let voice = Voice::harmonica();
        voice.envelope.note_on(0.0);
        assert_eq!(voice.envelope.amplitude(3.0), 0.8);

        voice.envelope.note_off(3.0);
        assert_eq!(voice.sound(3.0 + 0.40, 220.0), 0.0);
    }

    #[test]
    fn noise_partial_ignores_base_frequency() {
        let partial = Partial::new(0.0, Waveform::Noise, 1.0);
        assert_eq!(partial.template.frequency, 0.0);
        let value = partial.sample(0.5, 440.0);
        assert!((-1.0..=1.0).contains(&value));
    }
}
