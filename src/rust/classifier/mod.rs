use std::collections::BTreeMap;

mod error;
mod embedding;
mod types;
mod store;
#[allow(clippy::module_inception)]
mod classifier;
pub mod builder;
mod utils;

pub use error::{ClassifierError, EmbeddingError};
pub use embedding::{ColorHistogramEmbedder, EmbeddingProvider};
pub use types::{ClassifierDataset, FeatureVector, Label, Prediction, PredictionResult};
pub use store::ExampleStore;
pub use classifier::{Classifier, DistanceMetric};
pub use builder::ClassifierBuilder;

/// Information about the current configuration of a classifier and the dataset it votes over
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierInfo {
    /// Neighbors consulted per vote
    pub k: usize,
    /// Distance used to rank neighbors
    pub metric: DistanceMetric,
    /// Number of labels with at least one example
    pub num_classes: usize,
    /// Total number of stored examples
    pub num_examples: usize,
    /// Examples per label
    pub class_sizes: BTreeMap<Label, usize>,
    /// Size of the stored embedding vectors, if any are stored
    pub embedding_size: Option<usize>,
}
