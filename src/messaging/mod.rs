mod bus;
mod types;

pub use bus::{BusStatus, MessageBus};
pub use types::SynthMessage;
