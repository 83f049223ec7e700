use std::sync::atomic::{AtomicBool, Ordering};
use crate::core::synth::AtomicF64;

/// Amplitudes at or below this are returned as exact silence.
pub const SILENCE_FLOOR: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Idle,
}

/// ADSR shape. Times are in seconds, amplitudes in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeConfig {
    pub attack: f64,
    pub decay: f64,
    pub release: f64,
    pub sustain: f64,
    pub start: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.05,
            decay: 0.01,
            release: 0.20,
            sustain: 0.8,
            start: 1.0,
        }
    }
}

impl EnvelopeConfig {
    pub fn value_at_stage(&self, stage: EnvelopeStage, time_in_stage: f64) -> f64 {
        match stage {
            EnvelopeStage::Attack => {
                if self.attack > 0.0 {
                    (time_in_stage / self.attack) * self.start
                } else {
                    self.start
                }
            },
            EnvelopeStage::Decay => {
                if self.decay > 0.0 {
                    (time_in_stage / self.decay) * (self.sustain - self.start) + self.start
                } else {
                    self.sustain
                }
            },
            EnvelopeStage::Sustain => self.sustain,
            EnvelopeStage::Release => {
                if self.release > 0.0 {
                    (time_in_stage / self.release) * (0.0 - self.sustain) + self.sustain
                } else {
                    0.0
                }
            },
            EnvelopeStage::Idle => 0.0,
        }
    }
}

/// Timestamp-driven ADSR generator.
///
/// The trigger state is written by the control thread through [`Envelope::note_on`]
/// and [`Envelope::note_off`] and read by the audio thread through
/// [`Envelope::amplitude`]. Each field is an independent atomic, so a reader may
/// see a new trigger time paired with an old held flag for at most one sample.
#[derive(Debug)]
pub struct Envelope {
    pub config: EnvelopeConfig,
    trigger_on: AtomicF64,
    trigger_off: AtomicF64,
    held: AtomicBool,
    triggered: AtomicBool,
}

impl Envelope {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self {
            config,
            trigger_on: AtomicF64::new(0.0),
            trigger_off: AtomicF64::new(0.0),
            held: AtomicBool::new(false),
            triggered: AtomicBool::new(false),
        }
    }

    /// Start (or restart) the attack phase at `time`.
    pub fn note_on(&self, time: f64) {
        self.trigger_on.store(time);
        self.triggered.store(true, Ordering::Release);
        self.held.store(true, Ordering::Release);
    }

    /// Start the release phase at `time`.
    pub fn note_off(&self, time: f64) {
        self.trigger_off.store(time);
        self.held.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Which phase the envelope is in at `time`, and how far into it.
    pub fn stage(&self, time: f64) -> (EnvelopeStage, f64) {
        if !self.triggered.load(Ordering::Acquire) {
            return (EnvelopeStage::Idle, 0.0);
        }

        if !self.held.load(Ordering::Acquire) {
            return (EnvelopeStage::Release, time - self.trigger_off.load());
        }

        let life_time = time - self.trigger_on.load();
        let attack = self.config.attack;
        let decay = self.config.decay;

        if life_time >= attack + decay {
            (EnvelopeStage::Sustain, life_time - attack - decay)
        } else if life_time <= attack {
            (EnvelopeStage::Attack, life_time)
        } else {
            (EnvelopeStage::Decay, life_time - attack)
        }
    }

    /// Amplitude multiplier in [0, 1] at `time`.
    pub fn amplitude(&self, time: f64) -> f64 {
        let (stage, time_in_stage) = self.stage(time);
        let amplitude = self.config.value_at_stage(stage, time_in_stage);

        if amplitude <= SILENCE_FLOOR {
            0.0
        } else {
            amplitude.min(1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn silent_before_first_note() {
        let env = Envelope::new(EnvelopeConfig::default());
        assert_eq!(env.stage(0.0).0, EnvelopeStage::Idle);
        assert_eq!(env.amplitude(0.0), 0.0);
        assert_eq!(env.amplitude(10.0), 0.0);
    }

    #[test]
    fn attack_is_linear_and_reaches_start_amplitude() {
        let env = Envelope::new(EnvelopeConfig::default());
        env.note_on(2.0);

        let mut previous = -1.0;
        for step in 0..50 {
            let time = 2.0 + step as f64 * 0.001;
            let amplitude = env.amplitude(time);
            if amplitude > 0.0 {
                assert!(close(amplitude, (time - 2.0) / 0.05), "not linear at {time}");
            }
            assert!(amplitude >= previous);
            previous = amplitude;
        }

        let env = Envelope::new(EnvelopeConfig::default());
        env.note_on(0.0);
        assert_eq!(env.amplitude(0.05), 1.0);
    }

    #[test]
    fn reference_scenario() {
        let env = Envelope::new(EnvelopeConfig::default());
        env.note_on(0.0);

        assert!(close(env.amplitude(0.025), 0.5));
        assert!(close(env.amplitude(0.06), 0.8));
        assert!(close(env.amplitude(0.055), 0.9));
    }

    #[test]
    fn sustain_is_exact_after_attack_and_decay() {
        let env = Envelope::new(EnvelopeConfig::default());
        env.note_on(1.0);

        for time in [1.07, 1.5, 3.0, 1000.0] {
            assert_eq!(env.amplitude(time), 0.8);
        }
    }

    #[test]
    fn release_ramps_from_sustain_to_silence() {
        let env = Envelope::new(EnvelopeConfig::default());
        env.note_on(0.0);
        env.note_off(1.0);

        assert!(!env.is_held());
        assert_eq!(env.amplitude(1.0), 0.8);
        assert!(close(env.amplitude(1.1), 0.4));
        assert_eq!(env.amplitude(1.2), 0.0);
        assert_eq!(env.amplitude(5.0), 0.0);
    }

    #[test]
    fn percussive_envelope_decays_to_nothing() {
        let env = Envelope::new(EnvelopeConfig {
            attack: 0.0,
            decay: 1.0,
            release: 1.0,
            sustain: 0.0,
            start: 1.0,
        });
        env.note_on(0.0);

        assert_eq!(env.amplitude(0.0), 1.0);
        assert!(close(env.amplitude(0.5), 0.5));
        assert_eq!(env.amplitude(1.0), 0.0);
        assert_eq!(env.amplitude(2.0), 0.0);
    }

    #[test]
    fn retrigger_restarts_attack() {
        let env = Envelope::new(EnvelopeConfig::default());
        env.note_on(0.0);
        assert_eq!(env.amplitude(1.0), 0.8);

        env.note_on(1.0);
        assert!(close(env.amplitude(1.025), 0.5));
    }

    #[test]
    fn tail_below_floor_snaps_to_zero() {
        let env = Envelope::new(EnvelopeConfig::default());
        env.note_on(0.0);
        env.note_off(1.0);

        // 0.8 * (1 - 0.19995 / 0.2) = 2e-4, then 0.8 * (1 - 0.199_99 / 0.2) = 4e-5
        assert!(env.amplitude(1.199_95) > 0.0);
        assert_eq!(env.amplitude(1.199_99), 0.0);
    }
}
