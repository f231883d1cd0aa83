/// Core error type.
///
/// Adapter crates map their specific errors into this type so the bot core
/// can handle failures consistently. `Transport` means the chat transport
/// rejected an operation (permanent for a given recipient: blocked bot,
/// deleted chat); `Provider` means an upstream data fetch failed (transient:
/// network, timeout, non-success status).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, Error>;
