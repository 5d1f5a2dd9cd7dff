//! An incrementally trained k-nearest-neighbor classifier that maps frame
//! embeddings to the letters A-Z and predicts a live stream of frames.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use fingerspell::{Classifier, ExampleStore, FeatureVector, Label};
//!
//! let store = ExampleStore::new();
//! store.add_example(Label::from_char('A')?, FeatureVector::new(vec![1.0, 0.0, 0.0])?)?;
//! store.add_example(Label::from_char('A')?, FeatureVector::new(vec![0.9, 0.1, 0.0])?)?;
//! store.add_example(Label::from_char('B')?, FeatureVector::new(vec![0.0, 1.0, 0.0])?)?;
//!
//! let classifier = Classifier::builder().with_k(3)?.build()?;
//! let query = FeatureVector::new(vec![0.8, 0.2, 0.0])?;
//! let prediction = store.with_dataset(|dataset| classifier.predict(dataset, &query))?;
//! println!("Predicted letter: {}", prediction.label);
//! # Ok(())
//! # }
//! ```
//!
//! # Streaming
//!
//! A [`StreamingPredictor`] repeatedly pulls a frame from a [`FrameSource`],
//! embeds it with an [`EmbeddingProvider`], classifies it and publishes the
//! result, until it is stopped through its [`StopHandle`] or reaches its
//! iteration cap (10 cycles by default).
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use fingerspell::{
//!     Classifier, ColorHistogramEmbedder, EmbeddingProvider, ExampleStore, Frame, FrameError,
//!     FrameSource, Label, StreamingPredictor,
//! };
//!
//! struct StillCamera(Frame);
//!
//! impl FrameSource for StillCamera {
//!     fn is_ready(&self) -> bool { true }
//!     fn current_frame(&self) -> Result<Frame, FrameError> { Ok(self.0.clone()) }
//! }
//!
//! let frame = Frame::solid(8, 8, [200, 40, 40]);
//! let embedder = ColorHistogramEmbedder::default();
//! let store = ExampleStore::new();
//! store.add_example(Label::from_char('R')?, embedder.embed(&frame)?)?;
//!
//! let mut predictor = StreamingPredictor::new(
//!     store,
//!     Classifier::default(),
//!     Arc::new(StillCamera(frame)),
//!     Arc::new(embedder),
//! );
//! let mut results = Vec::new();
//! let report = predictor.start(&mut results).await?;
//! assert_eq!(report.iterations, 10);
//! assert!(results.iter().all(|r| r.label.letter() == 'R'));
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod codec;
pub mod dataset_manager;
pub mod frames;
pub mod recognizer;
mod runtime;
pub mod streaming;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierDataset, ClassifierError, ClassifierInfo,
    ColorHistogramEmbedder, DistanceMetric, EmbeddingError, EmbeddingProvider, ExampleStore,
    FeatureVector, Label, Prediction, PredictionResult,
};
pub use dataset_manager::{DatasetError, DatasetManager, DATASET_FILE_NAME};
pub use frames::{Frame, FrameError, FrameSource, ImageDirSource};
pub use recognizer::Recognizer;
pub use runtime::RuntimeConfig;
pub use streaming::{
    PredictionObserver, SessionReport, SessionState, StopHandle, StopReason, StreamingPredictor,
    DEFAULT_MAX_ITERATIONS,
};

pub fn init_logger() {
    env_logger::init();
}
