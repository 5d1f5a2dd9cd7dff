//! JSON interchange format for a [`ClassifierDataset`].
//!
//! A dataset is one object with a single recognised top-level field, `data`,
//! mapping each label letter to its examples in insertion order:
//!
//! ```json
//! {"data":{"A":[[0.1,0.2],[0.3,0.4]],"B":[[0.5,0.6]]}}
//! ```
//!
//! Labels are written in alphabet order so encoding is deterministic.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::classifier::{ClassifierDataset, ClassifierError, FeatureVector, Label};

/// The top-level field holding the label -> vectors mapping
pub const DATASET_FIELD: &str = "data";

#[derive(Serialize)]
struct DatasetFile {
    data: BTreeMap<String, Vec<Vec<f32>>>,
}

/// Encodes the whole dataset as compact JSON.
pub fn encode(dataset: &ClassifierDataset) -> Result<String, ClassifierError> {
    let data = dataset
        .iter()
        .map(|(label, examples)| {
            (
                label.to_string(),
                examples.iter().map(FeatureVector::to_vec).collect(),
            )
        })
        .collect();
    serde_json::to_string(&DatasetFile { data })
        .map_err(|e| ClassifierError::Encoding(e.to_string()))
}

/// Decodes and validates a dataset.
///
/// # Errors
/// - `MalformedDataset` on invalid JSON, a non-object root or `data` field,
///   keys that are not letters A-Z, empty or non-array example lists,
///   non-numeric components, or mixed dimensionality
/// - `MissingField` if the `data` field is absent or null
pub fn decode(text: &str) -> Result<ClassifierDataset, ClassifierError> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| ClassifierError::MalformedDataset(format!("Invalid JSON: {}", e)))?;
    let root = root.as_object().ok_or_else(|| {
        ClassifierError::MalformedDataset("Top-level value must be an object".into())
    })?;

    let data = match root.get(DATASET_FIELD) {
        None | Some(Value::Null) => {
            return Err(ClassifierError::MissingField(DATASET_FIELD.to_string()))
        }
        Some(data) => data,
    };
    let data = data.as_object().ok_or_else(|| {
        ClassifierError::MalformedDataset(format!(
            "`{}` must map labels to lists of vectors",
            DATASET_FIELD
        ))
    })?;

    let mut classes = BTreeMap::new();
    for (key, examples) in data {
        let label = key
            .parse::<Label>()
            .map_err(|e| ClassifierError::MalformedDataset(e.to_string()))?;
        let examples = examples.as_array().ok_or_else(|| {
            ClassifierError::MalformedDataset(format!("Examples of label '{}' must be a list", label))
        })?;
        let vectors = examples
            .iter()
            .enumerate()
            .map(|(i, example)| decode_vector(label, i, example))
            .collect::<Result<Vec<_>, _>>()?;
        classes.insert(label, vectors);
    }

    ClassifierDataset::from_classes(classes)
        .map_err(|e| ClassifierError::MalformedDataset(e.to_string()))
}

fn decode_vector(label: Label, index: usize, value: &Value) -> Result<FeatureVector, ClassifierError> {
    let components = value.as_array().ok_or_else(|| {
        ClassifierError::MalformedDataset(format!(
            "Example {} of label '{}' must be a list of numbers",
            index + 1,
            label
        ))
    })?;
    let values = components
        .iter()
        .enumerate()
        .map(|(j, component)| {
            component.as_f64().map(|v| v as f32).ok_or_else(|| {
                ClassifierError::MalformedDataset(format!(
                    "Component {} of example {} of label '{}' is not a number",
                    j,
                    index + 1,
                    label
                ))
            })
        })
        .collect::<Result<Vec<f32>, _>>()?;
    FeatureVector::new(values).map_err(|e| {
        ClassifierError::MalformedDataset(format!(
            "Example {} of label '{}': {}",
            index + 1,
            label,
            e
        ))
    })
}
