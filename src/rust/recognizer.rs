use std::future::Future;
use std::sync::{Arc, RwLock};

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::classifier::{
    Classifier, ClassifierDataset, ClassifierError, EmbeddingProvider, ExampleStore, Label,
    PredictionResult,
};
use crate::codec;
use crate::frames::{FrameError, FrameSource};
use crate::runtime::RuntimeConfig;
use crate::streaming::{
    PredictionObserver, SessionReport, SessionState, StopHandle, StreamingPredictor,
};

struct ActiveSession {
    stop: StopHandle,
    task: JoinHandle<Result<SessionReport, ClassifierError>>,
}

fn read_lock<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

fn write_lock<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
}

/// Publishes to the session's receiver and remembers the latest result.
struct SessionObserver {
    results: mpsc::UnboundedSender<PredictionResult>,
    last: Arc<RwLock<Option<PredictionResult>>>,
}

impl PredictionObserver for SessionObserver {
    fn publish(&mut self, result: &PredictionResult) {
        write_lock(&self.last, Some(result.clone()));
        self.results.publish(result);
    }
}

/// The control surface a UI drives: add examples from the live frame,
/// start and stop recognition, export and import the dataset.
///
/// Sessions run as tokio tasks, so [`start_session`](Self::start_session)
/// must be called from within a runtime.
pub struct Recognizer<S, E> {
    store: ExampleStore,
    classifier: Classifier,
    source: Arc<S>,
    embedder: Arc<E>,
    max_iterations: usize,
    session: Option<ActiveSession>,
    state: Arc<RwLock<SessionState>>,
    last_prediction: Arc<RwLock<Option<PredictionResult>>>,
}

impl<S, E> Recognizer<S, E>
where
    S: FrameSource + 'static,
    E: EmbeddingProvider + 'static,
{
    pub fn new(source: S, embedder: E, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        config.validate()?;
        let classifier = Classifier::builder().with_runtime_config(config)?.build()?;
        Ok(Self {
            store: ExampleStore::new(),
            classifier,
            source: Arc::new(source),
            embedder: Arc::new(embedder),
            max_iterations: config.max_iterations,
            session: None,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            last_prediction: Arc::new(RwLock::new(None)),
        })
    }

    /// Awaits frame-source acquisition once, then builds the recognizer.
    ///
    /// # Errors
    /// - `Frame` if acquisition fails
    pub async fn connect<F>(acquire: F, embedder: E, config: &RuntimeConfig) -> Result<Self, ClassifierError>
    where
        F: Future<Output = Result<S, FrameError>>,
    {
        let source = acquire.await.map_err(|e| {
            warn!("Frame source acquisition failed: {}", e);
            e
        })?;
        info!("Frame source acquired");
        Self::new(source, embedder, config)
    }

    pub fn store(&self) -> &ExampleStore {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn class_count(&self) -> usize {
        self.store.class_count()
    }

    /// Embeds the current frame and stores it under `label`
    ///
    /// # Errors
    /// - `NotReady` if the frame source is not ready
    /// - `Frame` if no frame could be pulled
    /// - `InvalidInput` if the embedder could not produce a vector, or the
    ///   vector does not fit the stored examples
    pub fn add_example(&self, label: Label) -> Result<(), ClassifierError> {
        if !self.source.is_ready() {
            return Err(ClassifierError::NotReady("frame source is not ready".into()));
        }
        let frame = self.source.current_frame()?;
        let vector = self.embedder.embed(&frame).map_err(|e| {
            warn!("No example added for '{}': {}", label, e);
            ClassifierError::InvalidInput(format!("Could not embed the current frame: {}", e))
        })?;
        self.store.add_example(label, vector)?;
        info!("Example added for label '{}'", label);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .map(|session| !session.task.is_finished())
            .unwrap_or(false)
    }

    pub fn session_state(&self) -> SessionState {
        read_lock(&self.state)
    }

    /// Starts a recognition session and returns its result stream.
    ///
    /// A previous session that already finished is collected first.
    ///
    /// # Errors
    /// - `SessionActive` if a session is still running
    /// - `EmptyClassifier` / `NotReady` as for [`StreamingPredictor::begin`]
    pub async fn start_session(
        &mut self,
    ) -> Result<mpsc::UnboundedReceiver<PredictionResult>, ClassifierError> {
        if self.is_running() {
            return Err(ClassifierError::SessionActive);
        }
        if let Some(Err(e)) = self.wait_session().await {
            warn!("Previous recognition session ended with an error: {}", e);
        }

        let mut predictor = StreamingPredictor::new(
            self.store.clone(),
            self.classifier.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.embedder),
        )
        .with_max_iterations(self.max_iterations)?;
        predictor.begin()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut observer = SessionObserver {
            results: tx,
            last: Arc::clone(&self.last_prediction),
        };
        let stop = predictor.stop_handle();
        let state = Arc::clone(&self.state);
        write_lock(&state, SessionState::Running);
        let task = tokio::spawn(async move {
            let result = predictor.run(&mut observer).await;
            write_lock(&state, predictor.state());
            result
        });

        self.session = Some(ActiveSession { stop, task });
        Ok(rx)
    }

    /// Signals the running session to stop. Returns `false` if none is running.
    pub fn stop_session(&self) -> bool {
        match &self.session {
            Some(session) if !session.task.is_finished() => {
                info!("Stopping recognition session");
                session.stop.stop();
                true
            }
            _ => false,
        }
    }

    /// Waits for the current session to end and returns its outcome,
    /// or `None` if no session was started since the last collection.
    pub async fn wait_session(&mut self) -> Option<Result<SessionReport, ClassifierError>> {
        let session = self.session.take()?;
        let outcome = session.task.await.unwrap_or_else(|e| {
            write_lock(&self.state, SessionState::Failed);
            Err(ClassifierError::SessionAborted(e.to_string()))
        });
        Some(outcome)
    }

    /// Most recent result published by any session
    pub fn last_prediction(&self) -> Option<PredictionResult> {
        read_lock(&self.last_prediction)
    }

    pub fn export_dataset(&self) -> ClassifierDataset {
        self.store.export_dataset()
    }

    /// Encodes the current dataset for download
    pub fn export_encoded(&self) -> Result<String, ClassifierError> {
        codec::encode(&self.store.export_dataset())
    }

    /// Decodes `contents` and replaces the dataset. On error the current
    /// dataset is left untouched.
    pub fn import_dataset(&self, contents: &str) -> Result<(), ClassifierError> {
        let dataset = codec::decode(contents).map_err(|e| {
            warn!("Dataset import refused: {}", e);
            e
        })?;
        self.store.import_dataset(dataset);
        Ok(())
    }
}
