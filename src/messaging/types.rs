/// Message types for communication between input handling and the control loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthMessage {
    KeyDown(usize), // note index in the 16-key layout
    KeyUp(usize),
    AllNotesOff,
    AdjustVolume(f64), // relative step, e.g. +0.05
    Quit,
}
