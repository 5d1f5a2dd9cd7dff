mod common;

use std::sync::Arc;

use common::{label, Camera, ScriptedEmbedder, BLUE, GREEN, RED};
use fingerspell::{
    ClassifierError, ColorHistogramEmbedder, FrameError, Recognizer, RuntimeConfig, SessionState,
    StopReason, DEFAULT_MAX_ITERATIONS,
};

type TestRecognizer = Recognizer<Arc<Camera>, ColorHistogramEmbedder>;

fn recognizer() -> (TestRecognizer, Arc<Camera>) {
    let camera = Arc::new(Camera::showing(RED));
    let recognizer = Recognizer::new(
        Arc::clone(&camera),
        ColorHistogramEmbedder::default(),
        &RuntimeConfig::default(),
    )
    .expect("default config is valid");
    (recognizer, camera)
}

fn train(recognizer: &TestRecognizer, camera: &Camera) -> Result<(), ClassifierError> {
    for (letter, colour) in [('R', RED), ('G', GREEN), ('B', BLUE)] {
        camera.show(colour);
        for _ in 0..3 {
            recognizer.add_example(label(letter))?;
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_add_examples_from_live_frames() -> Result<(), Box<dyn std::error::Error>> {
    let (recognizer, camera) = recognizer();
    train(&recognizer, &camera)?;
    assert_eq!(recognizer.class_count(), 3);
    assert_eq!(recognizer.store().example_count(), 9);
    assert_eq!(camera.pulls(), 9);

    camera.set_ready(false);
    assert!(matches!(
        recognizer.add_example(label('X')),
        Err(ClassifierError::NotReady(_))
    ));
    assert_eq!(recognizer.class_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_session_predicts_current_frame() -> Result<(), Box<dyn std::error::Error>> {
    let (mut recognizer, camera) = recognizer();
    train(&recognizer, &camera)?;

    camera.show(GREEN);
    let mut results = recognizer.start_session().await?;
    assert_eq!(recognizer.session_state(), SessionState::Running);

    let mut received = Vec::new();
    while let Some(result) = results.recv().await {
        received.push(result);
    }

    let report = recognizer.wait_session().await.expect("session was started")?;
    assert_eq!(report.reason, StopReason::IterationCap);
    assert_eq!(received.len(), DEFAULT_MAX_ITERATIONS);
    assert!(received.iter().all(|r| r.label == label('G')));
    assert_eq!(recognizer.session_state(), SessionState::Stopped);
    assert_eq!(recognizer.last_prediction().map(|r| r.iteration), Some(10));
    assert!(recognizer.wait_session().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_stop_session_before_first_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let (mut recognizer, camera) = recognizer();
    train(&recognizer, &camera)?;

    let mut results = recognizer.start_session().await?;
    assert!(recognizer.stop_session());

    let report = recognizer.wait_session().await.expect("session was started")?;
    assert_eq!(report.reason, StopReason::Requested);
    assert_eq!(report.iterations, 0);
    assert!(results.recv().await.is_none());
    assert!(!recognizer.stop_session());
    Ok(())
}

#[tokio::test]
async fn test_stop_session_mid_stream() -> Result<(), Box<dyn std::error::Error>> {
    let (mut recognizer, camera) = recognizer();
    train(&recognizer, &camera)?;

    let mut results = recognizer.start_session().await?;
    for expected in 1..=3 {
        let result = results.recv().await.expect("session is running");
        assert_eq!(result.iteration, expected);
    }
    recognizer.stop_session();

    let report = recognizer.wait_session().await.expect("session was started")?;
    assert_eq!(report.reason, StopReason::Requested);
    assert!(report.iterations >= 3 && report.iterations < DEFAULT_MAX_ITERATIONS);
    assert_eq!(recognizer.session_state(), SessionState::Stopped);
    Ok(())
}

#[tokio::test]
async fn test_second_start_is_refused_while_running() -> Result<(), Box<dyn std::error::Error>> {
    let (mut recognizer, camera) = recognizer();
    train(&recognizer, &camera)?;

    let _results = recognizer.start_session().await?;
    assert!(matches!(
        recognizer.start_session().await,
        Err(ClassifierError::SessionActive)
    ));
    recognizer.wait_session().await.expect("session was started")?;

    // A fresh start after the session ended is allowed again.
    let mut results = recognizer.start_session().await?;
    assert_eq!(results.recv().await.map(|r| r.iteration), Some(1));
    recognizer.wait_session().await.expect("session was started")?;
    Ok(())
}

#[tokio::test]
async fn test_start_without_examples_is_refused() {
    let (mut recognizer, _camera) = recognizer();
    assert!(matches!(
        recognizer.start_session().await,
        Err(ClassifierError::EmptyClassifier)
    ));
    assert_eq!(recognizer.session_state(), SessionState::Idle);
    assert!(recognizer.wait_session().await.is_none());
}

#[tokio::test]
async fn test_export_import_through_control_surface() -> Result<(), Box<dyn std::error::Error>> {
    let (recognizer, camera) = recognizer();
    train(&recognizer, &camera)?;
    let exported = recognizer.export_encoded()?;

    let (other, _) = recognizer_with_config(RuntimeConfig::default())?;
    other.import_dataset(&exported)?;
    assert_eq!(other.export_dataset(), recognizer.export_dataset());

    let before = other.export_dataset();
    assert!(matches!(
        other.import_dataset(r#"{"weights":[]}"#),
        Err(ClassifierError::MissingField(_))
    ));
    assert!(matches!(
        other.import_dataset("{\"data\":"),
        Err(ClassifierError::MalformedDataset(_))
    ));
    assert_eq!(other.export_dataset(), before);
    Ok(())
}

fn scripted_recognizer(embedder: ScriptedEmbedder) -> Recognizer<Arc<Camera>, ScriptedEmbedder> {
    Recognizer::new(Arc::new(Camera::showing(RED)), embedder, &RuntimeConfig::default())
        .expect("default config is valid")
}

#[tokio::test]
async fn test_embedding_failure_on_add_is_invalid_input() -> Result<(), Box<dyn std::error::Error>> {
    let recognizer = scripted_recognizer(ScriptedEmbedder::failing_on(&[1.0, 0.0], &[1]));

    assert!(matches!(
        recognizer.add_example(label('A')),
        Err(ClassifierError::InvalidInput(_))
    ));
    assert_eq!(recognizer.class_count(), 0);

    recognizer.add_example(label('A'))?;
    assert_eq!(recognizer.class_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_empty_import_during_session_stops_it() -> Result<(), Box<dyn std::error::Error>> {
    let (mut recognizer, camera) = recognizer();
    train(&recognizer, &camera)?;

    let mut results = recognizer.start_session().await?;
    assert_eq!(results.recv().await.map(|r| r.iteration), Some(1));
    recognizer.import_dataset(r#"{"data":{}}"#)?;

    let report = recognizer.wait_session().await.expect("session was started")?;
    assert_eq!(report.reason, StopReason::DatasetEmptied);
    assert!(report.iterations < DEFAULT_MAX_ITERATIONS);
    assert_eq!(recognizer.session_state(), SessionState::Stopped);
    assert!(matches!(
        recognizer.start_session().await,
        Err(ClassifierError::EmptyClassifier)
    ));
    Ok(())
}

#[tokio::test]
async fn test_restart_after_uncollected_failed_session() -> Result<(), Box<dyn std::error::Error>> {
    // The first session cycle is the embedder's second call.
    let mut recognizer = scripted_recognizer(ScriptedEmbedder::failing_on(&[1.0, 0.0], &[2]));
    recognizer.add_example(label('A'))?;

    let mut failed = recognizer.start_session().await?;
    assert!(failed.recv().await.is_none());
    assert_eq!(recognizer.session_state(), SessionState::Failed);

    let mut results = recognizer.start_session().await?;
    let mut received = 0;
    while results.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, DEFAULT_MAX_ITERATIONS);

    let report = recognizer.wait_session().await.expect("session was started")?;
    assert_eq!(report.reason, StopReason::IterationCap);
    assert_eq!(recognizer.session_state(), SessionState::Stopped);
    Ok(())
}

#[tokio::test]
async fn test_connect_surfaces_acquisition_failure() {
    let acquire = async { Err::<Arc<Camera>, _>(FrameError::Unavailable("permission denied".into())) };
    let result: Result<TestRecognizer, _> =
        Recognizer::connect(acquire, ColorHistogramEmbedder::default(), &RuntimeConfig::default()).await;
    assert!(matches!(result, Err(ClassifierError::Frame(FrameError::Unavailable(_)))));

    let acquire = async { Ok::<_, FrameError>(Arc::new(Camera::showing(BLUE))) };
    let connected: Result<TestRecognizer, _> =
        Recognizer::connect(acquire, ColorHistogramEmbedder::default(), &RuntimeConfig::default()).await;
    assert!(connected.is_ok());
}

fn recognizer_with_config(config: RuntimeConfig) -> Result<(TestRecognizer, Arc<Camera>), ClassifierError> {
    let camera = Arc::new(Camera::showing(RED));
    let recognizer = Recognizer::new(Arc::clone(&camera), ColorHistogramEmbedder::default(), &config)?;
    Ok((recognizer, camera))
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = RuntimeConfig {
        max_iterations: 0,
        ..RuntimeConfig::default()
    };
    assert!(matches!(
        recognizer_with_config(config),
        Err(ClassifierError::ValidationError(_))
    ));
}
