use serde::{Serialize, Deserialize};
use std::f64::consts::{FRAC_2_PI, FRAC_PI_2, PI, TAU};

/// Number of partials summed by [`Waveform::AnalogSaw`].
pub const ANALOG_SAW_PARTIALS: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    AnalogSaw,  // Truncated Fourier series, warm but costs ANALOG_SAW_PARTIALS sines
    DigitalSaw, // Closed form, exact and O(1)
    Noise,
}

impl Waveform {
    /// Evaluate the waveform at `phase` radians.
    ///
    /// `phase` is `2π·f·t` plus any vibrato offset; it is not wrapped, so the
    /// caller can pass a phase that has been accumulating for hours.
    #[inline]
    pub fn sample(&self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                if phase.sin() >= 0.0 { 1.0 } else { -1.0 }
            },
            Waveform::Triangle => FRAC_2_PI * phase.sin().asin(),
            Waveform::AnalogSaw => {
                let mut sum = 0.0;
                for n in 1..=ANALOG_SAW_PARTIALS {
                    let n = n as f64;
                    sum += (n * phase).sin() / n;
                }
                // Truncation overshoots (Gibbs) by roughly 18% next to the wrap
                (sum * FRAC_2_PI).clamp(-1.0, 1.0)
            },
            Waveform::DigitalSaw => {
                // f·π·(t mod 1/f) is π times the fractional cycle count
                let cycle = (phase / TAU).rem_euclid(1.0);
                FRAC_2_PI * (cycle * PI - FRAC_PI_2)
            },
            Waveform::Noise => rand::random::<f64>() * 2.0 - 1.0,
        }
    }

    pub fn is_periodic(&self) -> bool {
        !matches!(self, Waveform::Noise)
    }
}
