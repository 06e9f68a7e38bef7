/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). The gated channel is addressed with this too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Subscription tier id (stable key into the catalog, e.g. "1_month").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TierId(pub String);

impl TierId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment id assigned by the payment provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PaymentId(pub String);

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
