//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and mouse input handling
//! - `events` - Engine completion events and timers
//! - `render` - Card strip, overlays and status bar

mod events;
mod input;
mod loop_runner;
mod render;

pub use loop_runner::{run, Action};
