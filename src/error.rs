use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by remote ledger calls.
///
/// The sync engine branches on these categories: `Unauthorized` forces a
/// sign-out, `Unreachable` takes the offline fallback (serve the cache,
/// queue the mutation), and `Remote` is surfaced to the user.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("the bearer credential is missing, expired or revoked")]
    Unauthorized,

    #[error("the remote ledger could not be reached: {0}")]
    Unreachable(String),

    #[error("the remote ledger rejected the request: {0}")]
    Remote(String),
}
