mod keyboard;
mod mapping;

pub use keyboard::{KeyAction, KeyTracker, KeyboardInput};
pub use mapping::{key_to_note, KEYBOARD_DIAGRAM, KEY_LAYOUT};
