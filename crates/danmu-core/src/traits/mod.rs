//! Ports implemented by the infrastructure layer

mod sink;

pub use sink::EventSink;
