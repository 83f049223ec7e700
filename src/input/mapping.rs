use crate::core::oscillator::NOTE_COUNT;

/// Computer keys for note indices 0..16, two rows laid out like a piano.
pub const KEY_LAYOUT: [char; NOTE_COUNT] = [
    'z', 's', 'x', 'c', 'f', 'v', 'g', 'b', 'n', 'j', 'm', 'k', ',', 'l', '.', '/',
];

pub const KEYBOARD_DIAGRAM: &str = "\
|   |   |   |   |   | |   |   |   |   | |   | |   |   |   |
|   | S |   |   | F | | G |   |   | J | | K | | L |   |   |
|   |___|   |   |___| |___|   |   |___| |___| |___|   |   |__
|     |     |     |     |     |     |     |     |     |     |
|  Z  |  X  |  C  |  V  |  B  |  N  |  M  |  ,  |  .  |  /  |
|_____|_____|_____|_____|_____|_____|_____|_____|_____|_____|";

/// Note index for a typed character, ignoring case.
pub fn key_to_note(key: char) -> Option<usize> {
    let key = key.to_ascii_lowercase();
    KEY_LAYOUT.iter().position(|&k| k == key)
}
