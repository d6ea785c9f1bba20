//! Telegram Bot API adapter (teloxide).
//!
//! Polls for updates and exposes the archive workflow as bot commands.

use teloxide::prelude::*;
use tokio::time::sleep;

pub mod handlers;
pub mod router;

use mab_core::{errors::Error, Result};

fn map_err(e: teloxide::RequestError) -> Error {
    Error::External(format!("telegram error: {e}"))
}

/// Run a Bot API request, retrying once when Telegram answers with `RetryAfter`.
async fn with_retry<T, Fut>(mut op: impl FnMut() -> Fut) -> Result<T>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
    Fut::IntoFuture: Send,
{
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match e {
                teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                    continue;
                }
                other => return Err(map_err(other)),
            },
        }
    }
}

/// Send a plain-text message to a chat.
pub async fn send_text(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    with_retry(|| bot.send_message(chat_id, text.to_string())).await?;
    Ok(())
}
