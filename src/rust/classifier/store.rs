use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};

use super::error::ClassifierError;
use super::types::{ClassifierDataset, FeatureVector, Label};

/// Append-only, per-label collection of examples.
///
/// Cloning an `ExampleStore` yields another handle to the same dataset. A
/// single lock guards the mapping, so readers never observe a half-applied
/// add or import.
#[derive(Debug, Clone, Default)]
pub struct ExampleStore {
    dataset: Arc<RwLock<ClassifierDataset>>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ExampleStore>();
    }
};

impl ExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: ClassifierDataset) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(dataset)),
        }
    }

    // Mutations validate before touching the map and never panic while the
    // write guard is held, so a poisoned lock still holds a consistent dataset.
    fn read(&self) -> RwLockReadGuard<'_, ClassifierDataset> {
        self.dataset.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClassifierDataset> {
        self.dataset.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends `vector` under `label`. No deduplication, no per-label cap.
    ///
    /// # Errors
    /// - `InvalidInput` if the vector's dimensionality differs from the stored examples
    pub fn add_example(&self, label: Label, vector: FeatureVector) -> Result<(), ClassifierError> {
        let mut dataset = self.write();
        dataset.push(label, vector)?;
        debug!(
            "Added example for '{}' ({} examples under label, {} classes)",
            label,
            dataset.examples(label).map_or(0, |examples| examples.len()),
            dataset.class_count()
        );
        Ok(())
    }

    pub fn class_count(&self) -> usize {
        self.read().class_count()
    }

    pub fn example_count(&self) -> usize {
        self.read().example_count()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.read().dimension()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.read().labels()
    }

    /// Returns a snapshot of the whole dataset taken under one read lock
    pub fn export_dataset(&self) -> ClassifierDataset {
        self.read().clone()
    }

    /// Replaces the entire dataset in one step. Nothing is merged.
    pub fn import_dataset(&self, dataset: ClassifierDataset) {
        let mut current = self.write();
        info!(
            "Replacing dataset ({} classes) with imported dataset ({} classes, {} examples)",
            current.class_count(),
            dataset.class_count(),
            dataset.example_count()
        );
        *current = dataset;
    }

    /// Runs `f` against the current dataset while holding the read lock
    pub fn with_dataset<R>(&self, f: impl FnOnce(&ClassifierDataset) -> R) -> R {
        f(&self.read())
    }
}
