use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use mab_core::{archive::ProvisionOutcome, domain::UserId};

use crate::router::AppState;

pub(super) const HELP_TEXT: &str = "I keep a private archive channel for you.\n\n\
/archive - create (or show) your personal archive channel\n\
/help - show this message";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn format_outcome(outcome: &ProvisionOutcome) -> String {
    match outcome {
        ProvisionOutcome::Existing(id) => format!("Your archive channel: {id}"),
        ProvisionOutcome::Created(id) => {
            format!("Created your personal archive channel: {id}")
        }
        ProvisionOutcome::RateLimited { seconds } => format!(
            "Telegram is rate limiting channel creation ({seconds}s). Please send /archive again."
        ),
        ProvisionOutcome::Unavailable(_) => {
            "The archive service is unavailable right now. Please try again later.".to_string()
        }
        ProvisionOutcome::Failed(_) => {
            "Could not create your archive channel. Please try again later.".to_string()
        }
    }
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let text = msg.text().unwrap_or("");
    let (cmd, _args) = parse_command(text);

    let reply = match cmd.as_str() {
        "start" | "help" => HELP_TEXT.to_string(),
        "archive" => {
            let Some(user) = msg.from() else {
                return Ok(());
            };
            let user_id = user.id.0 as i64;

            let _guard = state.user_locks.lock_user(user_id).await;
            let outcome = state
                .archive
                .provision(UserId(user_id), &state.bot_username)
                .await;
            info!("[Bot] /archive for user {user_id}: {outcome:?}");
            format_outcome(&outcome)
        }
        other => format!("Unknown command: /{other}\n\n{HELP_TEXT}"),
    };

    if let Err(e) = crate::send_text(&bot, msg.chat.id, &reply).await {
        warn!("[Bot] Failed to reply to /{cmd}: {e}");
    }
    Ok(())
}
