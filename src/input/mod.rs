//! Controller input model
//!
//! The canonical `InputState` snapshot plus the stick math used to fill it.

pub mod state;
pub mod stick;

pub use state::{ButtonId, InputState};
pub use stick::{StickId, StickVector, VisualOffset};

/// Receives the whole snapshot after every mutation.
///
/// Implementations must not block; a sink that cannot deliver right now
/// drops the snapshot (the next mutation supersedes it).
pub trait InputSink: Send {
    fn emit(&mut self, state: &InputState);
}

/// Sink that records every emitted snapshot (tests, diagnostics).
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub emitted: Vec<InputState>,
}

impl InputSink for RecordingSink {
    fn emit(&mut self, state: &InputState) {
        self.emitted.push(state.clone());
    }
}
