use std::sync::Arc;

use ndarray::Array1;

use super::error::{ClassifierError, EmbeddingError};
use super::types::FeatureVector;
use super::utils::normalize_vector;
use crate::frames::Frame;

/// Turns a frame into a fixed-length feature vector.
///
/// Providers are treated as black boxes: they must not touch the example
/// store and must always produce vectors of the same width.
pub trait EmbeddingProvider: Send + Sync {
    /// Width of the produced vectors, when known up front
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Embeds one frame
    ///
    /// # Errors
    /// - `EmbeddingError` if the frame cannot be embedded
    fn embed(&self, frame: &Frame) -> Result<FeatureVector, EmbeddingError>;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<T> {
    fn dimension(&self) -> Option<usize> {
        (**self).dimension()
    }

    fn embed(&self, frame: &Frame) -> Result<FeatureVector, EmbeddingError> {
        (**self).embed(frame)
    }
}

/// A lightweight built-in provider: per-channel colour histograms.
///
/// Produces `3 * bins` components (red bins, then green, then blue), L2-normalised.
/// Mostly useful for demos and tests where no image model is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorHistogramEmbedder {
    bins: usize,
}

impl ColorHistogramEmbedder {
    pub const DEFAULT_BINS: usize = 16;

    pub fn new(bins: usize) -> Result<Self, ClassifierError> {
        if bins == 0 || bins > 256 {
            return Err(ClassifierError::ValidationError(format!(
                "Histogram bins must be between 1 and 256, got {}",
                bins
            )));
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }
}

impl Default for ColorHistogramEmbedder {
    fn default() -> Self {
        Self {
            bins: Self::DEFAULT_BINS,
        }
    }
}

impl EmbeddingProvider for ColorHistogramEmbedder {
    fn dimension(&self) -> Option<usize> {
        Some(self.bins * 3)
    }

    fn embed(&self, frame: &Frame) -> Result<FeatureVector, EmbeddingError> {
        if frame.pixel_count() == 0 {
            return Err(EmbeddingError::new("frame has no pixels"));
        }

        let mut histogram = Array1::<f32>::zeros(self.bins * 3);
        for pixel in frame.pixels().chunks_exact(3) {
            for (channel, &value) in pixel.iter().enumerate() {
                let bin = value as usize * self.bins / 256;
                histogram[channel * self.bins + bin] += 1.0;
            }
        }

        FeatureVector::from_array(normalize_vector(&histogram))
            .map_err(|e| EmbeddingError::new(e.to_string()))
    }
}
