mod envelope;
mod note;
mod waveform;

// Re-export key types so they're accessible from core::oscillator
pub use self::envelope::{Envelope, EnvelopeConfig, EnvelopeStage, SILENCE_FLOOR};
pub use self::note::{note_frequency, BASE_FREQUENCY, NOTE_COUNT};
pub use self::waveform::{Waveform, ANALOG_SAW_PARTIALS};

use std::f64::consts::TAU;

/// Angular velocity in radians per second for a frequency in Hz.
#[inline]
pub fn angular_velocity(hertz: f64) -> f64 {
    TAU * hertz
}

/// Low-frequency phase modulation layered onto an oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vibrato {
    pub depth: f64,
    pub rate: f64,
}

impl Vibrato {
    pub fn new(depth: f64, rate: f64) -> Self {
        Self { depth, rate }
    }

    /// Phase offset in radians at `time` for a carrier at `hertz`.
    #[inline]
    pub fn phase_offset(&self, hertz: f64, time: f64) -> f64 {
        if self.depth == 0.0 || self.rate == 0.0 {
            return 0.0;
        }
        self.depth * hertz * (angular_velocity(self.rate) * time).sin()
    }
}

/// A single oscillator evaluation: what to play and how fast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorRequest {
    pub frequency: f64,
    pub waveform: Waveform,
    pub vibrato: Vibrato,
}

impl OscillatorRequest {
    pub fn new(frequency: f64, waveform: Waveform) -> Self {
        Self {
            frequency,
            waveform,
            vibrato: Vibrato::default(),
        }
    }

    pub fn with_vibrato(mut self, depth: f64, rate: f64) -> Self {
        self.vibrato = Vibrato::new(depth, rate);
        self
    }

    #[inline]
    pub fn sample(&self, time: f64) -> f64 {
        osc(self.frequency, time, self.waveform, self.vibrato)
    }
}

/// Instantaneous amplitude in [-1, 1] of `waveform` at `hertz` and `time` seconds.
///
/// Pure apart from [`Waveform::Noise`], which draws a fresh value per call.
/// Periodic kinds are silent at 0 Hz; noise ignores the frequency.
#[inline]
pub fn osc(hertz: f64, time: f64, waveform: Waveform, vibrato: Vibrato) -> f64 {
    if !waveform.is_periodic() {
        return waveform.sample(0.0);
    }
    if hertz == 0.0 {
        return 0.0;
    }
    let phase = angular_velocity(hertz) * time + vibrato.phase_offset(hertz, time);
    waveform.sample(phase)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_VIBRATO: Vibrato = Vibrato { depth: 0.0, rate: 0.0 };

    #[test]
    fn square_only_produces_unit_values() {
        for hertz in [55.0, 110.0, 261.63, 1000.0] {
            for step in 0..2000 {
                let time = step as f64 / 44_100.0;
                let value = osc(hertz, time, Waveform::Square, NO_VIBRATO);
                assert!(value == 1.0 || value == -1.0, "{hertz} Hz at {time} gave {value}");
            }
        }
    }

    #[test]
    fn sine_repeats_every_period() {
        for hertz in [110.0, 220.0, 440.0, 987.77] {
            let period = 1.0 / hertz;
            for step in 0..100 {
                let time = step as f64 * 0.000_73;
                let a = osc(hertz, time, Waveform::Sine, NO_VIBRATO);
                let b = osc(hertz, time + period, Waveform::Sine, NO_VIBRATO);
                assert!((a - b).abs() < 1e-9, "{hertz} Hz: {a} vs {b}");
            }
        }
    }

    #[test]
    fn saws_share_period_and_start_on_a_zero_crossing() {
        let hertz = 110.0;
        let period = 1.0 / hertz;

        assert_eq!(osc(hertz, 0.0, Waveform::AnalogSaw, NO_VIBRATO), 0.0);
        // The digital saw wraps from +1 to -1 at t = 0
        assert_eq!(osc(hertz, 0.0, Waveform::DigitalSaw, NO_VIBRATO), -1.0);
        assert!(osc(hertz, period * 0.999_999, Waveform::DigitalSaw, NO_VIBRATO) > 0.99);
        assert!(osc(hertz, period * 0.5, Waveform::DigitalSaw, NO_VIBRATO).abs() < 1e-9);

        for waveform in [Waveform::AnalogSaw, Waveform::DigitalSaw] {
            for step in 1..50 {
                let time = step as f64 * period / 50.0 + 0.000_1;
                let a = osc(hertz, time, waveform, NO_VIBRATO);
                let b = osc(hertz, time + period, waveform, NO_VIBRATO);
                assert!((a - b).abs() < 1e-6, "{waveform:?} at {time}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn digital_saw_matches_closed_form() {
        let hertz = 220.0;
        for step in 0..200 {
            let time = step as f64 * 0.000_37;
            let expected = std::f64::consts::FRAC_2_PI
                * (hertz * std::f64::consts::PI * (time % (1.0 / hertz)) - std::f64::consts::FRAC_PI_2);
            let value = osc(hertz, time, Waveform::DigitalSaw, NO_VIBRATO);
            assert!((value - expected).abs() < 1e-6, "{time}: {value} vs {expected}");
        }
    }

    #[test]
    fn outputs_stay_in_unit_range() {
        let vibrato = Vibrato::new(0.001, 5.0);
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Triangle,
            Waveform::AnalogSaw,
            Waveform::DigitalSaw,
            Waveform::Noise,
        ] {
            for step in 0..5000 {
                let time = step as f64 / 48_000.0;
                let value = osc(330.0, time, waveform, vibrato);
                assert!((-1.0..=1.0).contains(&value), "{waveform:?} gave {value}");
            }
        }
    }

    #[test]
    fn vibrato_bends_phase_but_not_at_zero_time() {
        let vibrato = Vibrato::new(0.001, 5.0);
        assert_eq!(vibrato.phase_offset(440.0, 0.0), 0.0);
        assert!(vibrato.phase_offset(440.0, 0.05) > 0.0);

        let plain = osc(440.0, 0.05, Waveform::Sine, NO_VIBRATO);
        let bent = osc(440.0, 0.05, Waveform::Sine, vibrato);
        assert!((plain - bent).abs() > 1e-6);
    }

    #[test]
    fn periodic_kinds_are_silent_at_zero_hertz() {
        let vibrato = Vibrato::new(0.001, 5.0);
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Triangle,
            Waveform::AnalogSaw,
            Waveform::DigitalSaw,
        ] {
            for step in 0..100 {
                let time = step as f64 * 0.01;
                assert_eq!(osc(0.0, time, waveform, NO_VIBRATO), 0.0, "{waveform:?} at {time}");
                assert_eq!(osc(0.0, time, waveform, vibrato), 0.0, "{waveform:?} at {time}");
            }
        }

        let noise = osc(0.0, 0.5, Waveform::Noise, NO_VIBRATO);
        assert!((-1.0..=1.0).contains(&noise));
    }

    #[test]
    fn request_uses_its_own_frequency() {
        let request = OscillatorRequest::new(220.0, Waveform::Sine);
        assert_eq!(request.sample(0.001), osc(220.0, 0.001, Waveform::Sine, NO_VIBRATO));
    }
}
