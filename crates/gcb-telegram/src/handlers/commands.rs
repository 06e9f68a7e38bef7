use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use gcb_core::domain::UserId;

use crate::router::AppState;

use super::menus;

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

pub async fn handle_text(
    bot: Bot,
    msg: Message,
    text: &str,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    if text.starts_with('/') {
        let (cmd, _args) = parse_command(text);
        return match cmd.as_str() {
            "start" => send_welcome(bot, &msg).await,
            "tiers" => send_tiers(bot, &msg, &state).await,
            "status" => send_status(bot, &msg, &state).await,
            "help" => send_help(bot, &msg).await,
            _ => {
                bot.send_message(msg.chat.id, "Unknown command. Try /start.")
                    .await?;
                Ok(())
            }
        };
    }

    match text {
        menus::BTN_ACCESS => send_tiers(bot, &msg, &state).await,
        menus::BTN_CATALOG => send_catalog(bot, &msg, &state).await,
        menus::BTN_STATUS => send_status(bot, &msg, &state).await,
        menus::BTN_HELP => send_help(bot, &msg).await,
        // Free text outside the menu: just re-show the menu.
        _ => send_welcome(bot, &msg).await,
    }
}

async fn send_welcome(bot: Bot, msg: &Message) -> ResponseResult<()> {
    bot.send_message(
        msg.chat.id,
        "🌸 Hi! I'm the club assistant.\n\n\
         I sell access to the gated club channel: templates, stickers and \
         fresh ideas every week.\n\nPick an option below:",
    )
    .reply_markup(menus::main_menu())
    .await?;
    Ok(())
}

async fn send_tiers(bot: Bot, msg: &Message, state: &AppState) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, "Pick a plan and join the club 💌")
        .reply_markup(menus::tier_keyboard(&state.cfg.catalog))
        .await?;
    Ok(())
}

async fn send_catalog(bot: Bot, msg: &Message, state: &AppState) -> ResponseResult<()> {
    let text = "✨ The materials catalog holds standalone template and sticker \
                packs you can buy without a subscription.";

    let mut req = bot.send_message(msg.chat.id, text);
    if let Some(kb) = state
        .cfg
        .catalog_url
        .as_deref()
        .and_then(menus::catalog_keyboard)
    {
        req = req.reply_markup(kb);
    }
    req.await?;
    Ok(())
}

async fn send_status(bot: Bot, msg: &Message, state: &AppState) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let text = match state.ledger.expires_at(UserId(user.id.0 as i64)) {
        Some(expires_at) => format!(
            "📅 Your club access is active until <b>{}</b> (UTC).",
            expires_at.format("%Y-%m-%d %H:%M")
        ),
        None => "You don't have an active subscription. \
                 Tap <b>🔐 Club access</b> to get one."
            .to_string(),
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn send_help(bot: Bot, msg: &Message) -> ResponseResult<()> {
    bot.send_message(
        msg.chat.id,
        "🛟 Support\n\n\
         Something broken, or a payment didn't go through? Write to us and \
         we'll sort it out:\n\
         👉 https://t.me/club_support",
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        assert_eq!(parse_command("/start"), ("start".into(), "".into()));
        assert_eq!(parse_command("/Tiers "), ("tiers".into(), "".into()));
    }

    #[test]
    fn parses_botname_suffix_and_args() {
        assert_eq!(
            parse_command("/status@club_bot now"),
            ("status".into(), "now".into())
        );
    }
}
