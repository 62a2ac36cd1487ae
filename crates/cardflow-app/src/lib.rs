//! Cardflow replay driver.
//!
//! Plays a recorded pointer session against the board engine with a grid
//! layout standing in for the UI.

pub mod layout;
pub mod replay;

pub use layout::GridLayout;
pub use replay::{LoggingListener, ReplayCard, ReplayError, ScriptEvent, Session, run};
