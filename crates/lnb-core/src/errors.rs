/// Core error type for the relay bot.
///
/// Adapter crates (Telegram, HTTP) map their specific errors into this type so the
/// command handler and broadcaster can treat failures uniformly: fatal at startup,
/// reported-and-continue at request scope.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage init error: {0}")]
    StorageInit(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
