use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};
use tracing::error;

use gcb_core::{
    config::GrantPolicy,
    domain::{PaymentId, TierId, UserId},
    purchase::PurchaseOutcome,
    Error,
};

use crate::router::AppState;

/// Parsed callback payload: `tier:{tier_id}` or `paid:{payment_id}`.
#[derive(Clone, Debug, PartialEq, Eq)]
enum CallbackAction {
    TierSelected(TierId),
    PaidCheck(PaymentId),
}

fn parse_callback(data: &str) -> Option<CallbackAction> {
    let (prefix, arg) = data.split_once(':')?;
    if arg.is_empty() {
        return None;
    }
    match prefix {
        "tier" => Some(CallbackAction::TierSelected(TierId(arg.to_string()))),
        "paid" => Some(CallbackAction::PaidCheck(PaymentId(arg.to_string()))),
        _ => None,
    }
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let user = UserId(q.from.id.0 as i64);
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat.id) else {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    };

    let Some(action) = q.data.as_deref().and_then(parse_callback) else {
        let _ = bot
            .answer_callback_query(cb_id)
            .text("Invalid callback data")
            .await;
        return Ok(());
    };

    match action {
        CallbackAction::TierSelected(tier_id) => {
            let _ = bot.answer_callback_query(cb_id).await;

            match state.purchases.start_purchase(user, &tier_id).await {
                Ok(link) => {
                    let text = format!(
                        "🔗 <a href=\"{}\">Tap here to pay for your subscription</a>",
                        link.confirmation_url
                    );
                    let mut req = bot
                        .send_message(chat_id, text)
                        .parse_mode(ParseMode::Html)
                        .disable_web_page_preview(true);
                    if state.purchases.policy() == GrantPolicy::OnConfirmation {
                        req = req.reply_markup(super::menus::paid_check_keyboard(&link.id.0));
                    }
                    req.await?;
                }
                Err(Error::InvalidInput(_)) => {
                    // Stale keyboard from an old catalog; never retried.
                    bot.send_message(chat_id, "That plan no longer exists. Try /tiers.")
                        .await?;
                }
                Err(e) => {
                    error!(user = user.0, tier = %tier_id, "purchase failed: {e}");
                    bot.send_message(
                        chat_id,
                        "❌ The payment service is unavailable right now. \
                         Please try again in a few minutes.",
                    )
                    .await?;
                }
            }
        }

        CallbackAction::PaidCheck(payment_id) => {
            match state.purchases.confirm_purchase(&payment_id).await {
                Ok(PurchaseOutcome::Granted { expires_at }) => {
                    let _ = bot.answer_callback_query(cb_id).await;
                    bot.send_message(
                        chat_id,
                        format!(
                            "🎉 Payment received! Your club access is active until <b>{}</b> (UTC).",
                            expires_at.format("%Y-%m-%d %H:%M")
                        ),
                    )
                    .parse_mode(ParseMode::Html)
                    .await?;
                }
                Ok(PurchaseOutcome::NotPaidYet) => {
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text("Payment not received yet. Finish checkout and tap again.")
                        .await;
                }
                Ok(PurchaseOutcome::Canceled) => {
                    let _ = bot.answer_callback_query(cb_id).await;
                    bot.send_message(
                        chat_id,
                        "The payment was canceled. Pick a plan again with /tiers.",
                    )
                    .await?;
                }
                Err(Error::InvalidInput(_)) => {
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text("This payment is no longer tracked. Start over with /tiers.")
                        .await;
                }
                Err(e) => {
                    error!(user = user.0, payment = %payment_id, "confirmation check failed: {e}");
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text("Couldn't reach the payment service, try again shortly.")
                        .await;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tier_selection() {
        assert_eq!(
            parse_callback("tier:3_months"),
            Some(CallbackAction::TierSelected(TierId("3_months".into())))
        );
    }

    #[test]
    fn parses_paid_check() {
        assert_eq!(
            parse_callback("paid:2c8f3b1e-000f"),
            Some(CallbackAction::PaidCheck(PaymentId("2c8f3b1e-000f".into())))
        );
    }

    #[test]
    fn rejects_malformed_data() {
        assert_eq!(parse_callback("tier"), None);
        assert_eq!(parse_callback("tier:"), None);
        assert_eq!(parse_callback("refund:xyz"), None);
        assert_eq!(parse_callback(""), None);
    }
}
