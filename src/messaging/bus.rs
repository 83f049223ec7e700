use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;
use log::info;
use crate::core::{NoteController, SynthesisContext};
use super::SynthMessage;

/// Whether the control loop should keep running after a batch of messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStatus {
    Running,
    Quit,
}

/// MessageBus carries key transitions from input handling to the synth
///
/// The bus only holds the receiving end. Once every sender handed out by
/// [`MessageBus::new`] is dropped, waiting on the bus reports [`BusStatus::Quit`].
pub struct MessageBus {
    receiver: Receiver<SynthMessage>,
    notes: NoteController,
}

impl MessageBus {
    /// Create a new message bus connected to the synthesis context, plus the
    /// sender for input threads
    pub fn new(context: Arc<SynthesisContext>) -> (Self, Sender<SynthMessage>) {
        let (sender, receiver) = unbounded();

        let bus = MessageBus {
            receiver,
            notes: NoteController::new(context),
        };
        (bus, sender)
    }

    pub fn notes(&self) -> &NoteController {
        &self.notes
    }

    /// Process up to `max_messages` pending messages without blocking
    pub fn process_messages(&mut self, max_messages: usize) -> BusStatus {
        let mut count = 0;

        while count < max_messages {
            let Ok(msg) = self.receiver.try_recv() else {
                break;
            };
            count += 1;

            if self.handle_message(msg) == BusStatus::Quit {
                return BusStatus::Quit;
            }
        }
        BusStatus::Running
    }

    /// Block until the next message (or `timeout`) and handle it plus anything queued behind it
    pub fn wait_and_process(&mut self, timeout: Duration, max_messages: usize) -> BusStatus {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => {
                if self.handle_message(msg) == BusStatus::Quit {
                    return BusStatus::Quit;
                }
                self.process_messages(max_messages)
            },
            Err(RecvTimeoutError::Timeout) => BusStatus::Running,
            Err(RecvTimeoutError::Disconnected) => BusStatus::Quit,
        }
    }

    /// Handle an individual message, timestamped with the audio clock
    fn handle_message(&mut self, msg: SynthMessage) -> BusStatus {
        let time = self.notes.context().time();

        match msg {
            SynthMessage::KeyDown(index) => {
                self.notes.key_down(index, time);
            },
            SynthMessage::KeyUp(index) => {
                self.notes.key_up(index, time);
            },
            SynthMessage::AllNotesOff => {
                self.notes.all_notes_off(time);
            },
            SynthMessage::AdjustVolume(step) => {
                let context = self.notes.context();
                context.set_volume(context.volume() + step);
                info!("Master volume {:.2}", context.volume());
            },
            SynthMessage::Quit => {
                self.notes.all_notes_off(time);
                return BusStatus::Quit;
            },
        }
        BusStatus::Running
    }
}
