pub mod oscillator;
pub mod synth;
pub mod voice;
pub mod controller;

pub use synth::SynthesisContext;
pub use voice::{Voice, VoiceKind};
pub use controller::NoteController;
