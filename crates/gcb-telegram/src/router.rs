use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use gcb_core::{config::Config, ledger::SubscriptionLedger, purchase::PurchaseService};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub ledger: SubscriptionLedger,
    pub purchases: Arc<PurchaseService>,
}

/// Run the long-polling dispatcher until the process is stopped.
pub async fn run_polling(
    bot: Bot,
    cfg: Arc<Config>,
    ledger: SubscriptionLedger,
    purchases: Arc<PurchaseService>,
) -> anyhow::Result<()> {
    if let Ok(me) = bot.get_me().await {
        info!("gcb started: @{}", me.username());
    }
    info!(channel = cfg.channel_id.0, tiers = cfg.catalog.len(), "serving gated channel");

    let state = Arc::new(AppState {
        cfg,
        ledger,
        purchases,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
