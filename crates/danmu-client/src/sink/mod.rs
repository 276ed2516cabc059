//! Event sinks

mod console;

pub use console::{format_event, ConsoleSink};
