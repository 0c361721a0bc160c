//! Text helpers for terminal rendering and URL checks for the share opener.

mod text;
mod open_url;

pub use text::{compact_count, display_width, strip_control_chars, truncate_to_width};
pub use open_url::{validate_url_for_open, OpenUrlError};
