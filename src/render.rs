//! Offline rendering of a single note to a WAV file.
//!
//! Drives the same [`SynthesisContext`] the audio callback uses, with a sample
//! counter standing in for the device clock.

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};
use crate::core::oscillator::note_frequency;
use crate::core::{SynthesisContext, VoiceKind};

/// Longest note, hold plus tail, that will be rendered into memory
pub const MAX_RENDER_SECONDS: f64 = 600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub voice: VoiceKind,
    pub note: usize,
    /// Seconds between note on and note off
    pub hold: f64,
    /// Seconds rendered after note off
    pub tail: f64,
    pub sample_rate: u32,
    pub volume: f64,
    pub output: PathBuf,
}

/// Render every sample of the request into memory.
pub fn render_samples(request: &RenderRequest) -> Result<Vec<f32>> {
    let frequency = note_frequency(request.note)
        .with_context(|| format!("Note {} is outside the keyboard layout", request.note))?;
    anyhow::ensure!(request.sample_rate > 0, "Sample rate must be positive");
    anyhow::ensure!(
        request.hold.is_finite() && request.tail.is_finite(),
        "Durations must be finite"
    );
    anyhow::ensure!(request.hold >= 0.0 && request.tail >= 0.0, "Durations must not be negative");
    anyhow::ensure!(
        request.hold + request.tail <= MAX_RENDER_SECONDS,
        "Renders are limited to {} seconds",
        MAX_RENDER_SECONDS
    );

    let context = SynthesisContext::with_kind(request.voice);
    context.set_volume(request.volume);
    context.set_frequency(frequency);
    context.note_on(0.0);

    let sample_rate = request.sample_rate as f64;
    let release_at = (request.hold * sample_rate).round() as u64;
    let total = ((request.hold + request.tail) * sample_rate).round() as u64;

    let mut samples = Vec::with_capacity(total as usize);
    for n in 0..total {
        let time = n as f64 / sample_rate;
        if n == release_at {
            context.note_off(time);
        }
        samples.push(context.render(time) as f32);
    }
    Ok(samples)
}

/// Write samples as 16-bit mono PCM.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).context("Failed to write sample")?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

pub fn render_to_file(request: &RenderRequest) -> Result<()> {
    let samples = render_samples(request)?;
    write_wav(&request.output, &samples, request.sample_rate)?;
    info!(
        "Rendered {:?} note {} ({} samples at {} Hz) to {}",
        request.voice,
        request.note,
        samples.len(),
        request.sample_rate,
        request.output.display()
    );
    Ok(())
}
