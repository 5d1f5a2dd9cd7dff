use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::types::{ClassifierDataset, FeatureVector, Label, Prediction};
use super::utils::{cosine_distance, euclidean_distance, normalize_vector};
use super::ClassifierInfo;

/// Distance used to rank stored examples against a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`; both vectors are L2-normalised before comparison
    #[default]
    Cosine,
    /// Straight-line distance on the raw vectors, no normalisation
    Euclidean,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            other => Err(ClassifierError::ValidationError(format!(
                "Unknown distance metric '{}' (expected 'cosine' or 'euclidean')",
                other
            ))),
        }
    }
}

/// A k-nearest-neighbor classifier over the examples of a [`ClassifierDataset`].
///
/// The classifier holds only its parameters; every prediction is a pure
/// function of the dataset, the query and `k`.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use fingerspell::{Classifier, ExampleStore, FeatureVector, Label};
///
/// let store = ExampleStore::new();
/// store.add_example(Label::from_char('A')?, FeatureVector::new(vec![1.0, 0.0])?)?;
/// store.add_example(Label::from_char('B')?, FeatureVector::new(vec![0.0, 1.0])?)?;
///
/// let classifier = Classifier::builder().with_k(1)?.build()?;
/// let query = FeatureVector::new(vec![0.9, 0.2])?;
/// let prediction = store.with_dataset(|dataset| classifier.predict(dataset, &query))?;
/// assert_eq!(prediction.label.letter(), 'A');
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    pub(crate) k: usize,
    pub(crate) metric: DistanceMetric,
}

#[derive(Debug)]
struct Neighbor {
    label: Label,
    order: usize,
    distance: f32,
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Returns information about the classifier and the dataset it votes over
    pub fn info(&self, dataset: &ClassifierDataset) -> ClassifierInfo {
        ClassifierInfo {
            k: self.k,
            metric: self.metric,
            num_classes: dataset.class_count(),
            num_examples: dataset.example_count(),
            class_sizes: dataset.class_sizes(),
            embedding_size: dataset.dimension(),
        }
    }

    /// Predicts the label of `query` by majority vote among its `k` nearest examples.
    ///
    /// Neighbors are ranked by distance, then label, then insertion order. When
    /// labels tie on votes, the one whose nearest neighbor is closest wins, and
    /// after that the label earlier in the alphabet.
    ///
    /// # Errors
    /// - `EmptyClassifier` if the dataset has no classes
    /// - `InvalidInput` if the query's dimensionality differs from the dataset's
    pub fn predict(
        &self,
        dataset: &ClassifierDataset,
        query: &FeatureVector,
    ) -> Result<Prediction, ClassifierError> {
        if dataset.class_count() == 0 {
            return Err(ClassifierError::EmptyClassifier);
        }
        if let Some(dim) = dataset.dimension() {
            if dim != query.len() {
                return Err(ClassifierError::InvalidInput(format!(
                    "Query has {} dimensions, dataset expects {}",
                    query.len(),
                    dim
                )));
            }
        }

        let query = match self.metric {
            DistanceMetric::Cosine => normalize_vector(query.values()),
            DistanceMetric::Euclidean => query.values().clone(),
        };

        let mut neighbors = Vec::with_capacity(dataset.example_count());
        for (label, examples) in dataset.iter() {
            for (order, example) in examples.iter().enumerate() {
                neighbors.push(Neighbor {
                    label,
                    order,
                    distance: self.distance(&query, example.values()),
                });
            }
        }

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.label.cmp(&b.label))
                .then(a.order.cmp(&b.order))
        });
        neighbors.truncate(self.k.min(neighbors.len()));

        // Neighbors are sorted, so the first one seen per label is its nearest.
        let mut tally: BTreeMap<Label, (usize, f32)> = BTreeMap::new();
        for neighbor in &neighbors {
            tally
                .entry(neighbor.label)
                .and_modify(|(votes, _)| *votes += 1)
                .or_insert((1, neighbor.distance));
        }

        let (label, (votes, _)) = tally
            .iter()
            .max_by(|(label_a, (votes_a, nearest_a)), (label_b, (votes_b, nearest_b))| {
                votes_a
                    .cmp(votes_b)
                    .then(nearest_b.total_cmp(nearest_a))
                    .then(label_b.cmp(label_a))
            })
            .map(|(label, entry)| (*label, *entry))
            .ok_or(ClassifierError::EmptyClassifier)?;

        let total = neighbors.len();
        let confidences = tally
            .iter()
            .map(|(label, (votes, _))| (*label, *votes as f32 / total as f32))
            .collect();

        Ok(Prediction {
            label,
            votes,
            neighbors: total,
            confidences,
        })
    }

    fn distance(&self, query: &Array1<f32>, example: &Array1<f32>) -> f32 {
        match self.metric {
            DistanceMetric::Cosine => cosine_distance(query, example),
            DistanceMetric::Euclidean => euclidean_distance(query, example),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            k: super::builder::DEFAULT_K,
            metric: DistanceMetric::default(),
        }
    }
}
