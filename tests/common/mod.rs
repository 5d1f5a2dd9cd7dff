#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use fingerspell::{
    EmbeddingError, EmbeddingProvider, FeatureVector, Frame, FrameError, FrameSource, Label,
};

pub fn label(letter: char) -> Label {
    Label::from_char(letter).expect("valid letter")
}

pub fn vector(values: &[f32]) -> FeatureVector {
    FeatureVector::new(values.to_vec()).expect("valid vector")
}

pub const RED: [u8; 3] = [220, 20, 20];
pub const GREEN: [u8; 3] = [20, 220, 20];
pub const BLUE: [u8; 3] = [20, 20, 220];

/// A camera whose current frame the test controls.
pub struct Camera {
    frame: Mutex<Frame>,
    ready: AtomicBool,
    pulls: AtomicUsize,
}

impl Camera {
    pub fn showing(rgb: [u8; 3]) -> Self {
        Self {
            frame: Mutex::new(Frame::solid(4, 4, rgb)),
            ready: AtomicBool::new(true),
            pulls: AtomicUsize::new(0),
        }
    }

    pub fn not_ready() -> Self {
        let camera = Self::showing(RED);
        camera.ready.store(false, Ordering::SeqCst);
        camera
    }

    pub fn show(&self, rgb: [u8; 3]) {
        *self.frame.lock().unwrap() = Frame::solid(4, 4, rgb);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

impl FrameSource for Camera {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Result<Frame, FrameError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.lock().unwrap().clone())
    }
}

/// A source that is ready but cannot deliver frames.
pub struct BrokenCamera;

impl FrameSource for BrokenCamera {
    fn is_ready(&self) -> bool {
        true
    }

    fn current_frame(&self) -> Result<Frame, FrameError> {
        Err(FrameError::Unavailable("device disconnected".into()))
    }
}

/// Returns a fixed vector and fails on the given (1-based) calls.
pub struct ScriptedEmbedder {
    output: Vec<f32>,
    fail_on: Vec<usize>,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn constant(output: &[f32]) -> Self {
        Self::failing_on(output, &[])
    }

    pub fn failing_on(output: &[f32], fail_on: &[usize]) -> Self {
        Self {
            output: output.to_vec(),
            fail_on: fail_on.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for ScriptedEmbedder {
    fn embed(&self, _frame: &Frame) -> Result<FeatureVector, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(EmbeddingError::new(format!("model crashed on call {}", call)));
        }
        FeatureVector::new(self.output.clone()).map_err(|e| EmbeddingError::new(e.to_string()))
    }
}
