use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;

use crate::classifier::{ClassifierDataset, ClassifierError};
use crate::codec;

/// File name of the exported dataset artifact
pub const DATASET_FILE_NAME: &str = "knn-model.json";

/// Environment variable overriding the default data directory
pub const ENV_HOME: &str = "FINGERSPELL_HOME";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] ClassifierError),
}

/// Saves and loads the single dataset artifact.
#[derive(Debug, Clone)]
pub struct DatasetManager {
    data_dir: PathBuf,
    io_lock: Arc<Mutex<()>>,
}

impl DatasetManager {
    /// Creates a new DatasetManager with the default data directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_data_dir())
    }

    /// Returns the default data directory path
    pub fn get_default_data_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ENV_HOME) {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("fingerspell");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".fingerspell");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("fingerspell")
    }

    pub fn new<P: AsRef<Path>>(data_dir: P) -> io::Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            io_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the default artifact inside the data directory
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILE_NAME)
    }

    pub fn has_saved_dataset(&self) -> bool {
        self.dataset_path().exists()
    }

    /// Hex SHA-256 of an encoded dataset
    pub fn fingerprint(encoded: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(encoded.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub async fn save(&self, dataset: &ClassifierDataset) -> Result<PathBuf, DatasetError> {
        let path = self.dataset_path();
        self.save_to(&path, dataset).await?;
        Ok(path)
    }

    /// Encodes `dataset` and writes it to `path`, replacing any previous file.
    ///
    /// The text is written next to the target first and then renamed over it,
    /// so a reader never sees a half-written artifact.
    pub async fn save_to(&self, path: &Path, dataset: &ClassifierDataset) -> Result<(), DatasetError> {
        let _lock = self.io_lock.lock().await;
        let encoded = codec::encode(dataset)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let staging = path.with_extension("json.tmp");
        log::info!("Writing {} bytes to {:?}", encoded.len(), path);
        fs::write(&staging, encoded.as_bytes()).await?;
        fs::rename(&staging, path).await?;

        log::info!(
            "Saved dataset ({} classes, {} examples, sha256 {})",
            dataset.class_count(),
            dataset.example_count(),
            Self::fingerprint(&encoded)
        );
        Ok(())
    }

    pub async fn load(&self) -> Result<ClassifierDataset, DatasetError> {
        self.load_from(&self.dataset_path()).await
    }

    /// Reads and decodes the artifact at `path`
    pub async fn load_from(&self, path: &Path) -> Result<ClassifierDataset, DatasetError> {
        let _lock = self.io_lock.lock().await;
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).await?;
        log::info!("Read {} bytes from {:?}", text.len(), path);

        let dataset = codec::decode(&text).map_err(|e| {
            log::error!("Failed to decode dataset {:?}: {}", path, e);
            e
        })?;
        log::info!(
            "Loaded dataset ({} classes, {} examples, sha256 {})",
            dataset.class_count(),
            dataset.example_count(),
            Self::fingerprint(&text)
        );
        Ok(dataset)
    }

    /// Deletes the default artifact. A missing artifact is not an error.
    pub async fn remove_saved(&self) -> Result<(), DatasetError> {
        let _lock = self.io_lock.lock().await;
        let path = self.dataset_path();
        match fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Removed dataset {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
