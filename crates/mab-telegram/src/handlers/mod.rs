//! Telegram update handlers.
//!
//! Only commands are handled; everything else gets a short hint.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::warn;

use crate::router::AppState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.text().is_some_and(|t| t.starts_with('/')) {
        return commands::handle_command(bot, msg, state).await;
    }

    if let Err(e) = crate::send_text(&bot, msg.chat.id, commands::HELP_TEXT).await {
        warn!("[Bot] Failed to send hint: {e}");
    }
    Ok(())
}
