use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::io;

use log::{debug, info};

/// Errors raised while acquiring or reading frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to decode frame {path:?}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("No frames found in {0:?}")]
    NoFrames(PathBuf),
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    #[error("Frame source unavailable: {0}")]
    Unavailable(String),
}

/// One RGB8 frame, row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Frame {
    pub fn from_rgb8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(FrameError::InvalidFrame(format!(
                "{}x{} RGB frame needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// A frame filled with a single colour
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels: Vec<u8> = std::iter::repeat(rgb)
            .take(width as usize * height as usize)
            .flatten()
            .collect();
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Decodes an image file into a frame
pub fn load_frame(path: &Path) -> Result<Frame, FrameError> {
    let image = image::open(path).map_err(|e| FrameError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    Frame::from_rgb8(width, height, rgb.into_raw())
}

/// An exclusively owned source of live frames.
///
/// Implementations are acquired once and become ready on their own; callers
/// check [`is_ready`](FrameSource::is_ready) before pulling frames.
pub trait FrameSource: Send + Sync {
    /// Whether a current frame can be pulled
    fn is_ready(&self) -> bool;

    /// Pulls the current frame
    fn current_frame(&self) -> Result<Frame, FrameError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Arc<T> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn current_frame(&self) -> Result<Frame, FrameError> {
        (**self).current_frame()
    }
}

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Replays the image files of a directory as a looping frame stream.
#[derive(Debug)]
pub struct ImageDirSource {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    cursor: AtomicUsize,
}

impl ImageDirSource {
    /// Scans `dir` for PNG/JPEG files. Resolves once, ready or failed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, FrameError> {
        let dir = dir.as_ref().to_path_buf();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut frames = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame && entry.file_type().await?.is_file() {
                frames.push(path);
            }
        }
        if frames.is_empty() {
            return Err(FrameError::NoFrames(dir));
        }
        frames.sort();
        info!("Frame source ready: {} frames in {:?}", frames.len(), dir);
        Ok(Self {
            dir,
            frames,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn is_ready(&self) -> bool {
        !self.frames.is_empty()
    }

    fn current_frame(&self) -> Result<Frame, FrameError> {
        if self.frames.is_empty() {
            return Err(FrameError::NoFrames(self.dir.clone()));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        let path = &self.frames[index];
        debug!("Reading frame {} from {:?}", index, path);
        load_frame(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_validation() {
        assert!(Frame::from_rgb8(2, 2, vec![0; 12]).is_ok());
        assert!(matches!(
            Frame::from_rgb8(2, 2, vec![0; 11]),
            Err(FrameError::InvalidFrame(_))
        ));
        let frame = Frame::solid(3, 2, [1, 2, 3]);
        assert_eq!(frame.pixel_count(), 6);
        assert_eq!(&frame.pixels()[..6], &[1, 2, 3, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_image_dir_source_cycles_frames() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0])).save(dir.path().join("a.png"))?;
        image::RgbImage::from_pixel(3, 1, image::Rgb([0, 0, 255])).save(dir.path().join("b.png"))?;
        std::fs::write(dir.path().join("notes.txt"), "not a frame")?;

        let source = ImageDirSource::open(dir.path()).await?;
        assert!(source.is_ready());
        assert_eq!(source.len(), 2);

        assert_eq!(source.current_frame()?.width(), 2);
        assert_eq!(source.current_frame()?.width(), 3);
        assert_eq!(source.current_frame()?.pixels()[0], 255);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_dir_is_not_a_source() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let result = ImageDirSource::open(dir.path()).await;
        assert!(matches!(result, Err(FrameError::NoFrames(_))));
        Ok(())
    }
}
