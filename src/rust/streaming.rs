//! The streaming prediction loop.
//!
//! A [`StreamingPredictor`] owns one session's state: `Idle` until started,
//! `Running` while it pulls, embeds, classifies and publishes frames, then
//! `Stopped` (stop signal, iteration cap, or the dataset emptied under it) or
//! `Failed` (any other cycle error).
//! Only a fresh [`begin`](StreamingPredictor::begin) leaves `Stopped` or `Failed`.
//!
//! Cancellation is cooperative. The stop flag is checked between cycles and
//! the loop yields to the scheduler after every cycle, so a stop request is
//! observed within one embed+predict round.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::classifier::{Classifier, ClassifierError, EmbeddingProvider, ExampleStore, PredictionResult};
use crate::frames::FrameSource;

/// Cycles after which a session stops on its own
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
    Failed,
}

/// Why a session ended without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A stop signal was received between cycles
    Requested,
    /// The session reached its iteration cap
    IterationCap,
    /// Every example was removed (an empty import) while the session ran
    DatasetEmptied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub reason: StopReason,
    /// Results published during the session
    pub iterations: usize,
}

/// Cloneable stop signal for a [`StreamingPredictor`].
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the running session to stop before its next cycle
    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// Receives every result a session publishes.
pub trait PredictionObserver: Send {
    fn publish(&mut self, result: &PredictionResult);
}

impl PredictionObserver for Vec<PredictionResult> {
    fn publish(&mut self, result: &PredictionResult) {
        self.push(result.clone());
    }
}

impl PredictionObserver for mpsc::UnboundedSender<PredictionResult> {
    fn publish(&mut self, result: &PredictionResult) {
        if self.send(result.clone()).is_err() {
            debug!("Prediction receiver dropped; result {} not delivered", result.iteration);
        }
    }
}

pub struct StreamingPredictor<S, E> {
    store: ExampleStore,
    classifier: Classifier,
    source: Arc<S>,
    embedder: Arc<E>,
    max_iterations: usize,
    state: SessionState,
    iterations: usize,
    stop: StopHandle,
}

impl<S: FrameSource, E: EmbeddingProvider> StreamingPredictor<S, E> {
    pub fn new(store: ExampleStore, classifier: Classifier, source: Arc<S>, embedder: Arc<E>) -> Self {
        Self {
            store,
            classifier,
            source,
            embedder,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            state: SessionState::Idle,
            iterations: 0,
            stop: StopHandle::default(),
        }
    }

    /// Overrides the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self, ClassifierError> {
        if max_iterations == 0 {
            return Err(ClassifierError::ValidationError(
                "Iteration cap must be at least 1".into(),
            ));
        }
        self.max_iterations = max_iterations;
        Ok(self)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Cycles completed in the current (or last) session
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns a handle that stops this predictor's sessions
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Moves to `Running`, resetting the iteration counter and any pending stop.
    ///
    /// A refused start leaves the state untouched.
    ///
    /// # Errors
    /// - `SessionActive` if a session is already running
    /// - `EmptyClassifier` if the store has no classes
    /// - `NotReady` if the frame source is not ready
    pub fn begin(&mut self) -> Result<(), ClassifierError> {
        if self.state == SessionState::Running {
            return Err(ClassifierError::SessionActive);
        }
        if self.store.class_count() == 0 {
            warn!("Refusing to start recognition: no examples in the classifier");
            return Err(ClassifierError::EmptyClassifier);
        }
        if !self.source.is_ready() {
            warn!("Refusing to start recognition: frame source is not ready");
            return Err(ClassifierError::NotReady("frame source is not ready".into()));
        }
        self.iterations = 0;
        self.stop.reset();
        self.state = SessionState::Running;
        info!(
            "Recognition session started ({} classes, cap {} cycles)",
            self.store.class_count(),
            self.max_iterations
        );
        Ok(())
    }

    /// Drives a started session until it stops or fails.
    ///
    /// # Errors
    /// - `NotReady` if [`begin`](Self::begin) was not called first
    /// - any error raised by a cycle; the session is then `Failed`
    pub async fn run<O: PredictionObserver>(
        &mut self,
        observer: &mut O,
    ) -> Result<SessionReport, ClassifierError> {
        if self.state != SessionState::Running {
            return Err(ClassifierError::NotReady("session has not been started".into()));
        }

        loop {
            if self.stop.is_stop_requested() {
                return Ok(self.finish(StopReason::Requested));
            }

            match self.cycle() {
                Ok(result) => {
                    debug!(
                        "Cycle {}: predicted '{}' ({:.0}%)",
                        result.iteration,
                        result.label,
                        result.confidence() * 100.0
                    );
                    observer.publish(&result);
                }
                Err(ClassifierError::EmptyClassifier) => {
                    return Ok(self.finish(StopReason::DatasetEmptied));
                }
                Err(e) => {
                    self.state = SessionState::Failed;
                    error!("Recognition session failed at cycle {}: {}", self.iterations + 1, e);
                    return Err(e);
                }
            }

            if self.iterations >= self.max_iterations {
                return Ok(self.finish(StopReason::IterationCap));
            }

            tokio::task::yield_now().await;
        }
    }

    /// [`begin`](Self::begin) followed by [`run`](Self::run)
    pub async fn start<O: PredictionObserver>(
        &mut self,
        observer: &mut O,
    ) -> Result<SessionReport, ClassifierError> {
        self.begin()?;
        self.run(observer).await
    }

    fn cycle(&mut self) -> Result<PredictionResult, ClassifierError> {
        let frame = self.source.current_frame()?;
        let vector = self.embedder.embed(&frame)?;
        let classifier = &self.classifier;
        let prediction = self.store.with_dataset(|dataset| classifier.predict(dataset, &vector))?;
        self.iterations += 1;
        Ok(prediction.at_iteration(self.iterations))
    }

    fn finish(&mut self, reason: StopReason) -> SessionReport {
        self.state = SessionState::Stopped;
        match reason {
            StopReason::Requested => info!("Recognition stopped on request after {} cycles", self.iterations),
            StopReason::IterationCap => info!("Recognition stopped after {} cycles", self.iterations),
            StopReason::DatasetEmptied => warn!(
                "Recognition stopped after {} cycles: the classifier no longer has examples",
                self.iterations
            ),
        }
        SessionReport {
            reason,
            iterations: self.iterations,
        }
    }
}
