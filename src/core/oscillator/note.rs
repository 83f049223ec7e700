/// Frequency of note index 0 (A2).
pub const BASE_FREQUENCY: f64 = 110.0;

/// Number of playable positions in the note layout.
pub const NOTE_COUNT: usize = 16;

/// Equal-tempered frequency for a note index, or `None` outside the layout.
///
/// This is the only place a frequency reaches the oscillators from, so an
/// out-of-range index never turns into a zero or negative frequency.
pub fn note_frequency(index: usize) -> Option<f64> {
    if index >= NOTE_COUNT {
        return None;
    }
    Some(BASE_FREQUENCY * 2.0f64.powf(index as f64 / 12.0))
}
