use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use log::{debug, info, warn};
use std::io::stdout;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use crate::core::oscillator::NOTE_COUNT;
use crate::messaging::SynthMessage;
use super::mapping::key_to_note;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const VOLUME_STEP: f64 = 0.05;

/// What the terminal reported for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

impl From<KeyEventKind> for KeyAction {
    fn from(kind: KeyEventKind) -> Self {
        match kind {
            KeyEventKind::Press => KeyAction::Press,
            KeyEventKind::Repeat => KeyAction::Repeat,
            KeyEventKind::Release => KeyAction::Release,
        }
    }
}

/// Collapses raw key reports into clean down/up edges per note.
///
/// Auto-repeat never produces a second `KeyDown`. When `release_timeout` is set
/// (terminals that do not report releases) a key that has not repeated within
/// the timeout is treated as released.
pub struct KeyTracker {
    last_seen: [Option<Instant>; NOTE_COUNT],
    release_timeout: Option<Duration>,
}

impl KeyTracker {
    pub fn new(release_timeout: Option<Duration>) -> Self {
        Self {
            last_seen: [None; NOTE_COUNT],
            release_timeout,
        }
    }

    pub fn is_down(&self, index: usize) -> bool {
        self.last_seen.get(index).is_some_and(|seen| seen.is_some())
    }

    pub fn on_key(&mut self, index: usize, action: KeyAction, now: Instant) -> Option<SynthMessage> {
        let slot = self.last_seen.get_mut(index)?;

        match action {
            KeyAction::Press | KeyAction::Repeat => {
                let was_down = slot.replace(now).is_some();
                if was_down { None } else { Some(SynthMessage::KeyDown(index)) }
            },
            KeyAction::Release => slot.take().map(|_| SynthMessage::KeyUp(index)),
        }
    }

    /// Synthesize releases for keys that went quiet longer than the timeout.
    pub fn expire(&mut self, now: Instant) -> Vec<SynthMessage> {
        let Some(timeout) = self.release_timeout else {
            return Vec::new();
        };

        let mut released = Vec::new();
        for (index, slot) in self.last_seen.iter_mut().enumerate() {
            if let Some(seen) = *slot {
                if now.duration_since(seen) >= timeout {
                    *slot = None;
                    released.push(SynthMessage::KeyUp(index));
                }
            }
        }
        released
    }
}

/// Map a terminal key event to a control message that is not a note.
fn command_for(key: &KeyEvent) -> Option<SynthMessage> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(SynthMessage::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(SynthMessage::Quit),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(SynthMessage::AdjustVolume(VOLUME_STEP)),
        KeyCode::Char('-') => Some(SynthMessage::AdjustVolume(-VOLUME_STEP)),
        KeyCode::Char(' ') => Some(SynthMessage::AllNotesOff),
        _ => None,
    }
}

/// Puts the terminal into raw mode and restores it on drop.
struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;

        let enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .context("Failed to enable key release reporting")?;
        }
        Ok(Self { enhanced })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads the computer keyboard on its own thread and feeds the message bus.
pub struct KeyboardInput {
    handle: JoinHandle<Result<()>>,
}

impl KeyboardInput {
    /// Start reading keys. `release_timeout` is only used when the terminal
    /// cannot report key releases.
    pub fn spawn(sender: Sender<SynthMessage>, release_timeout: Duration) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("keyboard".into())
            .spawn(move || {
                let guard = TerminalGuard::enter()?;
                let timeout = if guard.enhanced {
                    info!("Terminal reports key releases");
                    None
                } else {
                    warn!(
                        "Terminal does not report key releases, notes end {} ms after the last repeat",
                        release_timeout.as_millis()
                    );
                    Some(release_timeout)
                };
                let result = read_keys(&sender, KeyTracker::new(timeout));
                drop(guard);
                result
            })
            .context("Failed to spawn keyboard thread")?;

        Ok(Self { handle })
    }

    /// Wait for the keyboard thread to finish, surfacing any terminal error.
    pub fn join(self) -> Result<()> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => anyhow::bail!("Keyboard thread panicked"),
        }
    }
}

fn read_keys(sender: &Sender<SynthMessage>, mut tracker: KeyTracker) -> Result<()> {
    loop {
        if event::poll(POLL_INTERVAL).context("Failed to poll terminal events")? {
            if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
                let message = match key.code {
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        match key_to_note(c) {
                            Some(index) => tracker.on_key(index, key.kind.into(), Instant::now()),
                            None => command_for(&key),
                        }
                    },
                    _ => command_for(&key),
                };

                if let Some(message) = message {
                    debug!("Key event {:?}", message);
                    if sender.send(message).is_err() || message == SynthMessage::Quit {
                        return Ok(());
                    }
                }
            }
        }

        for message in tracker.expire(Instant::now()) {
            if sender.send(message).is_err() {
                return Ok(());
            }
        }
    }
}
