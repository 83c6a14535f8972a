use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConclaveError {
    #[error("stream error: {0}")]
    Stream(String),
    #[error("join failed: {0}")]
    Join(String),
    #[error("permission request failed: {0}")]
    Permission(String),
    #[error("log upload failed: {0}")]
    LogUpload(String),
    #[error("in-meeting subscriptions already active ({0} held)")]
    SubscriptionsActive(usize),
    #[error("host unavailable: {0}")]
    Host(String),
}
