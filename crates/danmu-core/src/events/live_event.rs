//! Live events - records decoded from a broadcast room's frame stream
//!
//! These are the only shapes the output side ever sees. Presentation is the
//! sink's concern; the protocol layer never formats for a terminal.

use serde::{Deserialize, Serialize};

/// All event records delivered to an [`EventSink`](crate::EventSink)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiveEvent {
    /// Viewer/population count pushed by the server
    Popularity { count: u32 },

    /// A chat message
    Danmaku { sender: String, text: String },

    /// A gift sent to the broadcaster
    Gift {
        sender: String,
        action: String,
        gift: String,
        quantity: i64,
    },

    /// A command the client does not recognize, kept raw
    UnknownCommand { cmd: String, raw: String },
}
