use std::sync::Arc;

use teloxide::Bot;
use tokio_util::sync::CancellationToken;
use tracing::error;

use gcb_core::{
    config::Config, ledger::SubscriptionLedger, purchase::PurchaseService, sweeper::ExpirySweeper,
};
use gcb_telegram::TelegramChannelGate;
use gcb_yookassa::YooKassaClient;

#[tokio::main]
async fn main() -> Result<(), gcb_core::Error> {
    gcb_core::logging::init("gcb")?;

    let cfg = Arc::new(Config::load()?);

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let payments = Arc::new(YooKassaClient::new(
        cfg.yookassa_shop_id.clone(),
        cfg.yookassa_secret_key.clone(),
    ));

    let ledger = SubscriptionLedger::new();
    let purchases = Arc::new(PurchaseService::new(
        cfg.catalog.clone(),
        ledger.clone(),
        payments,
        cfg.grant_policy,
        cfg.currency.clone(),
        cfg.return_url.clone(),
    ));

    let gate = Arc::new(TelegramChannelGate::new(bot.clone()));
    let cancel = CancellationToken::new();
    let sweeper = ExpirySweeper::new(ledger.clone(), gate, cfg.channel_id);
    let sweep_task = sweeper.spawn(cfg.sweep_interval, cancel.clone());

    let result = gcb_telegram::router::run_polling(bot, cfg, ledger, purchases).await;

    cancel.cancel();
    if let Err(e) = sweep_task.await {
        error!("sweeper task aborted: {e}");
    }

    result.map_err(|e| gcb_core::Error::External(format!("telegram bot failed: {e}")))
}
