//! Session state machine
//!
//! Pure transitions over session state; the runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{SessionPhase, SessionState};
pub use transition::{transition, TransitionError};
