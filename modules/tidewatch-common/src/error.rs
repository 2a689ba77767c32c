use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidewatchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Collector error: {0}")]
    Collector(String),

    #[error("External feed error: {0}")]
    Feed(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
