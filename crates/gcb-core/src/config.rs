use std::{env, fs, path::Path, time::Duration};

use crate::{catalog::TierCatalog, domain::ChatId, errors::Error, Result};

/// When the subscription ledger gets written during a purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantPolicy {
    /// Grant access the moment the payment link is issued (the original
    /// bot's optimistic behavior; access exists whether or not money moves).
    AtIntent,
    /// Grant access only once the provider reports the payment succeeded.
    OnConfirmation,
}

impl GrantPolicy {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "intent" => Ok(Self::AtIntent),
            "confirmation" => Ok(Self::OnConfirmation),
            other => Err(Error::Config(format!(
                "GRANT_ACCESS must be 'intent' or 'confirmation', got '{other}'"
            ))),
        }
    }
}

/// Typed configuration, read from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    /// The gated channel whose membership this bot controls.
    pub channel_id: ChatId,

    // Payment provider
    pub yookassa_shop_id: String,
    pub yookassa_secret_key: String,
    pub currency: String,
    /// Where YooKassa redirects the user after checkout.
    pub return_url: String,

    // Catalog
    pub catalog: TierCatalog,
    /// Optional materials-shop link shown in the menu.
    pub catalog_url: Option<String>,

    // Behavior
    pub grant_policy: GrantPolicy,
    pub sweep_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let channel_id = env_i64("CHANNEL_ID").ok_or_else(|| {
            Error::Config("CHANNEL_ID environment variable is required".to_string())
        })?;

        let yookassa_shop_id = env_str("YOOKASSA_SHOP_ID")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("YOOKASSA_SHOP_ID environment variable is required".to_string())
            })?;
        let yookassa_secret_key = env_str("YOOKASSA_SECRET_KEY")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("YOOKASSA_SECRET_KEY environment variable is required".to_string())
            })?;

        let currency = env_str("CURRENCY").and_then(non_empty).unwrap_or_else(|| "RUB".to_string());
        let return_url = env_str("RETURN_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://t.me".to_string());

        let catalog_url = env_str("CATALOG_URL").and_then(non_empty);

        let grant_policy = match env_str("GRANT_ACCESS") {
            Some(raw) => GrantPolicy::parse(&raw)?,
            None => GrantPolicy::OnConfirmation,
        };

        // Once per day unless overridden.
        let sweep_interval =
            Duration::from_secs(env_u64("SWEEP_INTERVAL_SECS").unwrap_or(86_400).max(1));

        Ok(Self {
            telegram_bot_token,
            channel_id: ChatId(channel_id),
            yookassa_shop_id,
            yookassa_secret_key,
            currency,
            return_url,
            catalog: TierCatalog::standard(),
            catalog_url,
            grant_policy,
            sweep_interval,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
