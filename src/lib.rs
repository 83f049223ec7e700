//! Monophonic keyboard synthesizer.
//!
//! [`core`] holds the real-time sample engine (oscillators, ADSR envelope,
//! instrument voices and the shared [`core::SynthesisContext`]). The other
//! modules connect it to a terminal keyboard, a cpal output stream and WAV files.

pub mod core;
pub mod messaging;
pub mod input;
pub mod settings;
pub mod render;
pub mod app;
