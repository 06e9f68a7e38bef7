/// Core error type for the bot.
///
/// Adapter crates (Telegram, YooKassa) map their specific errors into this
/// type so the core can decide consistently between "retry later" and
/// "surface to the user".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// An external service (payment provider, messaging platform) failed or
    /// was unreachable. Safe to retry on a later cycle.
    #[error("external error: {0}")]
    External(String),

    /// Bad input that retrying will never fix (unknown tier id, malformed
    /// callback data, unknown payment id).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a later retry of the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::External(_) | Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
