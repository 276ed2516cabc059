//! Built-in command handlers

use danmu_core::LiveEvent;

use super::registry::{CommandEnvelope, CommandHandler};
use super::HandlerResult;

/// `DANMU_MSG`: chat text at `info[1]`, sender name at `info[2][1]`
#[derive(Debug, Clone, Copy, Default)]
pub struct DanmakuHandler;

impl CommandHandler for DanmakuHandler {
    fn handle(&self, command: &CommandEnvelope<'_>) -> HandlerResult<Option<LiveEvent>> {
        Ok(Some(LiveEvent::Danmaku {
            sender: command.str_at("/info/2/1")?.to_string(),
            text: command.str_at("/info/1")?.to_string(),
        }))
    }
}

/// `SEND_GIFT`: fields under `data`
///
/// Sender and gift name are required. A missing `action` prints as empty and
/// a missing or non-integer `num` as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct GiftHandler;

impl CommandHandler for GiftHandler {
    fn handle(&self, command: &CommandEnvelope<'_>) -> HandlerResult<Option<LiveEvent>> {
        Ok(Some(LiveEvent::Gift {
            sender: command.str_at("/data/uname")?.to_string(),
            action: command.opt_str("/data/action").unwrap_or_default().to_string(),
            gift: command.str_at("/data/giftName")?.to_string(),
            quantity: command.opt_i64("/data/num").unwrap_or(0),
        }))
    }
}

/// Fallback for names nobody registered: log and pass the raw payload on
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownCommandHandler;

impl CommandHandler for UnknownCommandHandler {
    fn handle(&self, command: &CommandEnvelope<'_>) -> HandlerResult<Option<LiveEvent>> {
        let raw = command.raw_str();
        tracing::warn!(cmd = %command.cmd, raw = %raw, "Unknown command");

        Ok(Some(LiveEvent::UnknownCommand {
            cmd: command.cmd.to_string(),
            raw: raw.into_owned(),
        }))
    }
}
