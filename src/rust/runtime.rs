use std::env;
use std::path::PathBuf;

use crate::classifier::builder::{DEFAULT_K, MAX_K};
use crate::classifier::{ClassifierError, DistanceMetric};
use crate::dataset_manager::DatasetManager;
use crate::streaming::DEFAULT_MAX_ITERATIONS;

pub const ENV_K: &str = "FINGERSPELL_K";
pub const ENV_METRIC: &str = "FINGERSPELL_METRIC";
pub const ENV_MAX_ITERATIONS: &str = "FINGERSPELL_MAX_ITERATIONS";

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Neighbors consulted per vote
    pub k: usize,
    pub metric: DistanceMetric,
    /// Cycles after which a streaming session stops on its own
    pub max_iterations: usize,
    /// Where the dataset artifact is saved and loaded by default
    pub data_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            metric: DistanceMetric::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            data_dir: DatasetManager::get_default_data_dir(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `FINGERSPELL_K`, `FINGERSPELL_METRIC` and
    /// `FINGERSPELL_MAX_ITERATIONS`. The data directory honours `FINGERSPELL_HOME`.
    pub fn from_env() -> Result<Self, ClassifierError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides looked up by variable name
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ClassifierError> {
        if let Some(k) = lookup(ENV_K) {
            self.k = parse_count(ENV_K, &k)?;
        }
        if let Some(metric) = lookup(ENV_METRIC) {
            self.metric = metric.parse()?;
        }
        if let Some(max_iterations) = lookup(ENV_MAX_ITERATIONS) {
            self.max_iterations = parse_count(ENV_MAX_ITERATIONS, &max_iterations)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.k == 0 || self.k > MAX_K {
            return Err(ClassifierError::ValidationError(format!(
                "k must be between 1 and {}, got {}",
                MAX_K, self.k
            )));
        }
        if self.max_iterations == 0 {
            return Err(ClassifierError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize, ClassifierError> {
    value.trim().parse::<usize>().map_err(|_| {
        ClassifierError::ValidationError(format!(
            "{} must be a positive integer, got '{}'",
            name, value
        ))
    })
}
