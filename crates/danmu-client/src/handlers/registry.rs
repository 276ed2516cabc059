//! Command registry
//!
//! Routes command events by their `cmd` name. Every name resolves to exactly
//! one outcome: a registered handler, the suppressed (no-op) set, or the
//! fallback handler.
//!
//! # Example
//!
//! ```ignore
//! use danmu_client::handlers::CommandRegistry;
//!
//! let mut registry = CommandRegistry::with_defaults();
//! registry.suppress("INTERACT_WORD");
//! registry.register("SUPER_CHAT_MESSAGE", |cmd: &CommandEnvelope<'_>| -> HandlerResult<_> {
//!     Ok(Some(LiveEvent::Danmaku {
//!         sender: cmd.str_at("/data/user_info/uname")?.to_string(),
//!         text: cmd.str_at("/data/message")?.to_string(),
//!     }))
//! });
//! ```

use danmu_core::LiveEvent;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::commands::{DanmakuHandler, GiftHandler, UnknownCommandHandler};
use super::{HandlerError, HandlerResult};

/// Command names that are recognized and deliberately produce no event
pub const SUPPRESSED_COMMANDS: &[&str] = &[
    "WELCOME",
    "WELCOME_GUARD",
    "SYS_MSG",
    "PREPARING",
    "LIVE",
    "WISH_BOTTLE",
    "NOTICE_MSG",
    "ROOM_RANK",
    "COMBO_SEND",
    "COMBO_END",
    "ROOM_BLOCK_MSG",
    "ENTRY_EFFECT",
];

/// A parsed command event handed to a [`CommandHandler`]
#[derive(Debug, Clone, Copy)]
pub struct CommandEnvelope<'a> {
    /// Value of the `cmd` field
    pub cmd: &'a str,
    /// The whole JSON object
    pub body: &'a Value,
    /// Payload bytes as received
    pub raw: &'a [u8],
}

impl<'a> CommandEnvelope<'a> {
    /// Look up a required string by JSON pointer (`/info/2/1`)
    pub fn str_at(&self, pointer: &str) -> HandlerResult<&'a str> {
        self.opt_str(pointer).ok_or_else(|| self.missing(pointer, "string"))
    }

    pub fn opt_str(&self, pointer: &str) -> Option<&'a str> {
        self.body.pointer(pointer).and_then(Value::as_str)
    }

    /// Integer at `pointer`; `None` for floats, strings and absent fields
    pub fn opt_i64(&self, pointer: &str) -> Option<i64> {
        self.body.pointer(pointer).and_then(Value::as_i64)
    }

    /// Raw payload as text
    pub fn raw_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.raw)
    }

    fn missing(&self, pointer: &str, kind: &str) -> HandlerError {
        HandlerError::malformed(format!("{}: no {kind} at {pointer}", self.cmd))
    }
}

/// Turns one command event into at most one live event
pub trait CommandHandler: Send + Sync + 'static {
    fn handle(&self, command: &CommandEnvelope<'_>) -> HandlerResult<Option<LiveEvent>>;
}

impl<F> CommandHandler for F
where
    F: Fn(&CommandEnvelope<'_>) -> HandlerResult<Option<LiveEvent>> + Send + Sync + 'static,
{
    fn handle(&self, command: &CommandEnvelope<'_>) -> HandlerResult<Option<LiveEvent>> {
        self(command)
    }
}

/// Registry mapping command names to handlers
pub struct CommandRegistry {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
    suppressed: HashSet<String>,
    fallback: Box<dyn CommandHandler>,
}

impl CommandRegistry {
    /// Create a registry with no handlers; every command goes to the fallback
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            suppressed: HashSet::new(),
            fallback: Box::new(UnknownCommandHandler),
        }
    }

    /// Create a registry with the built-in chat and gift handlers and the
    /// default suppressed set
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("DANMU_MSG", DanmakuHandler)
            .register("SEND_GIFT", GiftHandler);
        for cmd in SUPPRESSED_COMMANDS {
            registry.suppress(*cmd);
        }
        registry
    }

    /// Register a handler for `cmd`, replacing any previous handler or
    /// suppression for that name
    pub fn register(&mut self, cmd: impl Into<String>, handler: impl CommandHandler) -> &mut Self {
        let cmd = cmd.into();
        self.suppressed.remove(&cmd);
        self.handlers.insert(cmd, Box::new(handler));
        self
    }

    /// Mark `cmd` as a recognized no-op, removing any handler for it
    pub fn suppress(&mut self, cmd: impl Into<String>) -> &mut Self {
        let cmd = cmd.into();
        self.handlers.remove(&cmd);
        self.suppressed.insert(cmd);
        self
    }

    /// Replace the handler used for unrecognized names
    pub fn set_fallback(&mut self, handler: impl CommandHandler) -> &mut Self {
        self.fallback = Box::new(handler);
        self
    }

    /// Route one command event
    pub fn handle(&self, command: &CommandEnvelope<'_>) -> HandlerResult<Option<LiveEvent>> {
        if self.suppressed.contains(command.cmd) {
            return Ok(None);
        }

        match self.handlers.get(command.cmd) {
            Some(handler) => handler.handle(command),
            None => self.fallback.handle(command),
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();
        let mut suppressed: Vec<_> = self.suppressed.iter().collect();
        suppressed.sort();

        f.debug_struct("CommandRegistry")
            .field("handlers", &handlers)
            .field("suppressed", &suppressed)
            .finish_non_exhaustive()
    }
}
