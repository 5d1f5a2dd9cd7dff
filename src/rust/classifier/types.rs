use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;

use super::error::ClassifierError;

/// One of the 26 uppercase letters a gesture can be labelled with.
///
/// Labels are ordered by their alphabet index, which is also the order used
/// for deterministic tie-breaking and for dataset export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(u8);

impl Label {
    /// Size of the closed label alphabet
    pub const COUNT: usize = 26;

    /// Returns the label at `index` in the alphabet (`0 => 'A'`, `25 => 'Z'`)
    pub fn from_index(index: usize) -> Result<Self, ClassifierError> {
        if index < Self::COUNT {
            Ok(Self(index as u8))
        } else {
            Err(ClassifierError::InvalidInput(format!(
                "Label index {} is out of range (0..{})",
                index,
                Self::COUNT
            )))
        }
    }

    pub fn from_char(letter: char) -> Result<Self, ClassifierError> {
        if letter.is_ascii_uppercase() {
            Ok(Self(letter as u8 - b'A'))
        } else {
            Err(ClassifierError::InvalidInput(format!(
                "Label must be an uppercase letter A-Z, got {:?}",
                letter
            )))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }

    /// Iterates over the whole alphabet in order
    pub fn all() -> impl Iterator<Item = Label> {
        (0..Self::COUNT as u8).map(Label)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Label {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Self::from_char(letter),
            _ => Err(ClassifierError::InvalidInput(format!(
                "Label must be a single letter, got {:?}",
                s
            ))),
        }
    }
}

/// A fixed-length embedding of one frame. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Array1<f32>);

impl FeatureVector {
    /// Creates a vector, rejecting empty input and non-finite components
    pub fn new(values: Vec<f32>) -> Result<Self, ClassifierError> {
        Self::from_array(Array1::from(values))
    }

    pub fn from_array(values: Array1<f32>) -> Result<Self, ClassifierError> {
        if values.is_empty() {
            return Err(ClassifierError::InvalidInput("Feature vector cannot be empty".into()));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::InvalidInput(format!(
                "Feature vector component {} is not a finite number",
                pos
            )));
        }
        // Owned copies are always contiguous in standard layout.
        Ok(Self(values.iter().copied().collect()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &Array1<f32> {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

/// The full mapping from label to the examples stored under it.
///
/// Invariants upheld by every constructor:
/// - a label is present only if it has at least one example
/// - every vector shares the same dimensionality
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierDataset {
    classes: BTreeMap<Label, Vec<FeatureVector>>,
}

impl ClassifierDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from a complete mapping, validating its invariants
    pub fn from_classes(
        classes: BTreeMap<Label, Vec<FeatureVector>>,
    ) -> Result<Self, ClassifierError> {
        let mut dimension: Option<usize> = None;
        for (label, examples) in &classes {
            if examples.is_empty() {
                return Err(ClassifierError::InvalidInput(format!(
                    "Label '{}' has no examples",
                    label
                )));
            }
            for (i, example) in examples.iter().enumerate() {
                match dimension {
                    None => dimension = Some(example.len()),
                    Some(dim) if dim != example.len() => {
                        return Err(ClassifierError::InvalidInput(format!(
                            "Example {} of label '{}' has {} dimensions, expected {}",
                            i + 1,
                            label,
                            example.len(),
                            dim
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(Self { classes })
    }

    /// Number of distinct labels with at least one example
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn example_count(&self) -> usize {
        self.classes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Dimensionality shared by every stored vector, if any are stored
    pub fn dimension(&self) -> Option<usize> {
        self.classes
            .values()
            .next()
            .and_then(|examples| examples.first())
            .map(FeatureVector::len)
    }

    pub fn labels(&self) -> Vec<Label> {
        self.classes.keys().copied().collect()
    }

    pub fn examples(&self, label: Label) -> Option<&[FeatureVector]> {
        self.classes.get(&label).map(Vec::as_slice)
    }

    /// Iterates labels in alphabet order with their examples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Label, &[FeatureVector])> {
        self.classes
            .iter()
            .map(|(label, examples)| (*label, examples.as_slice()))
    }

    /// Example counts per label
    pub fn class_sizes(&self) -> BTreeMap<Label, usize> {
        self.classes
            .iter()
            .map(|(label, examples)| (*label, examples.len()))
            .collect()
    }

    pub(crate) fn push(&mut self, label: Label, vector: FeatureVector) -> Result<(), ClassifierError> {
        if let Some(dim) = self.dimension() {
            if dim != vector.len() {
                return Err(ClassifierError::InvalidInput(format!(
                    "Feature vector has {} dimensions, dataset expects {}",
                    vector.len(),
                    dim
                )));
            }
        }
        self.classes.entry(label).or_default().push(vector);
        Ok(())
    }
}

/// Outcome of one nearest-neighbor vote
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The winning label
    pub label: Label,
    /// Votes the winning label received
    pub votes: usize,
    /// Number of neighbors that took part in the vote
    pub neighbors: usize,
    /// Share of the vote per label that received at least one vote
    pub confidences: BTreeMap<Label, f32>,
}

impl Prediction {
    /// Attaches the session iteration this prediction was produced in
    pub fn at_iteration(self, iteration: usize) -> PredictionResult {
        PredictionResult {
            label: self.label,
            iteration,
            confidences: self.confidences,
        }
    }
}

/// A prediction published by a streaming session
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: Label,
    /// 1-based count of cycles completed so far in the session
    pub iteration: usize,
    pub confidences: BTreeMap<Label, f32>,
}

impl PredictionResult {
    /// Confidence of the predicted label
    pub fn confidence(&self) -> f32 {
        self.confidences.get(&self.label).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f32]) -> FeatureVector {
        FeatureVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn test_label_alphabet() {
        assert_eq!(Label::from_index(0).unwrap().letter(), 'A');
        assert_eq!(Label::from_index(25).unwrap().letter(), 'Z');
        assert!(Label::from_index(26).is_err());
        assert_eq!("Q".parse::<Label>().unwrap().index(), 16);
        assert!("q".parse::<Label>().is_err());
        assert!("AB".parse::<Label>().is_err());
        assert!("".parse::<Label>().is_err());
        assert_eq!(Label::all().count(), Label::COUNT);
        assert_eq!(Label::from_char('C').unwrap().to_string(), "C");
    }

    #[test]
    fn test_feature_vector_validation() {
        assert!(matches!(
            FeatureVector::new(vec![]),
            Err(ClassifierError::InvalidInput(_))
        ));
        assert!(matches!(
            FeatureVector::new(vec![1.0, f32::NAN]),
            Err(ClassifierError::InvalidInput(_))
        ));
        assert!(FeatureVector::new(vec![f32::INFINITY]).is_err());
        assert_eq!(vector(&[1.0, 2.0]).to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_dataset_invariants() {
        let a = Label::from_char('A').unwrap();
        let b = Label::from_char('B').unwrap();

        let mut empty_class = BTreeMap::new();
        empty_class.insert(a, vec![]);
        assert!(ClassifierDataset::from_classes(empty_class).is_err());

        let mut mixed = BTreeMap::new();
        mixed.insert(a, vec![vector(&[1.0, 2.0])]);
        mixed.insert(b, vec![vector(&[1.0])]);
        assert!(ClassifierDataset::from_classes(mixed).is_err());

        let mut dataset = ClassifierDataset::new();
        assert_eq!(dataset.dimension(), None);
        dataset.push(b, vector(&[0.0, 1.0])).unwrap();
        dataset.push(a, vector(&[1.0, 0.0])).unwrap();
        assert!(dataset.push(a, vector(&[1.0])).is_err());
        assert_eq!(dataset.labels(), vec![a, b]);
        assert_eq!(dataset.dimension(), Some(2));
        assert_eq!(dataset.example_count(), 2);
    }
}
