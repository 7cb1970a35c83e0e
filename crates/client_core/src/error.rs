use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// A second activation of the generate control while a run is in flight.
    #[error("a submission is already in flight")]
    AlreadySubmitted,
    #[error("failed to send execute event: {0}")]
    Send(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DownloadLinkError {
    #[error("download base URL '{base}' cannot carry path segments")]
    BaseCannotCarrySegments { base: String },
}
