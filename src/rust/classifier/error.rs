use crate::frames::FrameError;

/// Failure reported by an [`EmbeddingProvider`](super::EmbeddingProvider).
#[derive(Debug, thiserror::Error)]
#[error("Embedding error: {0}")]
pub struct EmbeddingError(pub String);

impl EmbeddingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Represents the different types of errors that can occur in the letter classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The embedding provider could not turn a frame into a vector
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// The frame source could not produce a frame
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// A prediction was requested before any example was added
    #[error("Classifier has no examples; add at least one example before predicting")]
    EmptyClassifier,
    /// A label or vector handed to the store was unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A dataset blob could not be decoded into a valid dataset
    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),
    /// A dataset blob lacks a required field
    #[error("Missing field: `{0}`")]
    MissingField(String),
    /// A session was started before its collaborators were ready
    #[error("Not ready: {0}")]
    NotReady(String),
    /// A session was started while another one is still running
    #[error("A recognition session is already running")]
    SessionActive,
    /// A session task ended without reporting an outcome
    #[error("Session aborted: {0}")]
    SessionAborted(String),
    /// A dataset could not be serialised
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// Error occurred due to invalid configuration parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
}
