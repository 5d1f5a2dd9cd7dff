use log::info;

use super::classifier::{Classifier, DistanceMetric};
use super::error::ClassifierError;
use crate::runtime::RuntimeConfig;

/// Neighbors consulted per vote unless configured otherwise
pub const DEFAULT_K: usize = 3;

/// Upper bound on `k`; larger votes are dominated by the biggest class
pub const MAX_K: usize = 100;

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    k: Option<usize>,
    metric: DistanceMetric,
}

impl ClassifierBuilder {
    /// Creates a new ClassifierBuilder with `k = 3` and cosine distance
    ///
    /// # Example
    /// ```
    /// use fingerspell::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            k: None,
            metric: DistanceMetric::default(),
        }
    }

    /// Sets the number of neighbors that take part in each vote
    ///
    /// # Arguments
    /// * `k` - Neighbor count, between 1 and [`MAX_K`]
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - `k` was already set
    ///   - `k` is zero or larger than [`MAX_K`]
    ///
    /// # Example
    /// ```
    /// use fingerspell::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new().with_k(5);
    /// assert!(builder.is_ok());
    /// assert!(ClassifierBuilder::new().with_k(0).is_err());
    /// ```
    pub fn with_k(mut self, k: usize) -> Result<Self, ClassifierError> {
        if self.k.is_some() {
            return Err(ClassifierError::ValidationError("Neighbor count already set".to_string()));
        }
        Self::validate_k(k)?;
        self.k = Some(k);
        Ok(self)
    }

    /// Sets the distance metric used to rank neighbors
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Takes `k` and the metric from a runtime configuration
    pub fn with_runtime_config(self, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        Ok(self.with_k(config.k)?.with_metric(config.metric))
    }

    fn validate_k(k: usize) -> Result<(), ClassifierError> {
        if k == 0 {
            return Err(ClassifierError::ValidationError("Neighbor count must be at least 1".into()));
        }
        if k > MAX_K {
            return Err(ClassifierError::ValidationError(format!(
                "Neighbor count is too large ({}, max is {})",
                k, MAX_K
            )));
        }
        Ok(())
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Example
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use fingerspell::{ClassifierBuilder, DistanceMetric};
    ///
    /// let classifier = ClassifierBuilder::new()
    ///     .with_k(5)?
    ///     .with_metric(DistanceMetric::Euclidean)
    ///     .build()?;
    /// assert_eq!(classifier.k(), 5);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let k = self.k.unwrap_or(DEFAULT_K);
        Self::validate_k(k)?;
        info!("Built k-NN classifier (k = {}, metric = {})", k, self.metric);
        Ok(Classifier {
            k,
            metric: self.metric,
        })
    }
}
