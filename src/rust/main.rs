use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fingerspell::frames::load_frame;
use fingerspell::{
    ClassifierDataset, ColorHistogramEmbedder, DatasetError, DatasetManager, DistanceMetric,
    EmbeddingProvider, ExampleStore, ImageDirSource, Label, Recognizer, RuntimeConfig,
};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset file (defaults to knn-model.json in the data directory)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the classes stored in the dataset
    Info,
    /// Add example images under a letter and save the dataset
    Train {
        /// Letter A-Z the images show
        #[arg(short, long)]
        label: Label,
        /// Image files to embed
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Run one recognition session over a directory of frames
    Recognize {
        /// Directory of PNG/JPEG frames, replayed in name order
        #[arg(short, long)]
        frames: PathBuf,
        /// Neighbors consulted per vote
        #[arg(short, long)]
        k: Option<usize>,
        /// Distance metric: cosine or euclidean
        #[arg(short, long)]
        metric: Option<DistanceMetric>,
        /// Cycles after which the session stops on its own
        #[arg(long)]
        max_iterations: Option<usize>,
    },
}

async fn load_or_empty(manager: &DatasetManager, path: &Path) -> Result<ClassifierDataset> {
    match manager.load_from(path).await {
        Ok(dataset) => Ok(dataset),
        Err(DatasetError::NotFound(_)) => {
            info!("No dataset at {:?}; starting empty", path);
            Ok(ClassifierDataset::new())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load dataset {:?}", path)),
    }
}

async fn info_command(manager: &DatasetManager, path: &Path) -> Result<()> {
    let dataset = manager
        .load_from(path)
        .await
        .with_context(|| format!("Failed to load dataset {:?}", path))?;
    let encoded = fingerspell::codec::encode(&dataset)?;

    println!("Dataset: {}", path.display());
    println!("  Classes: {}", dataset.class_count());
    println!("  Examples: {}", dataset.example_count());
    match dataset.dimension() {
        Some(dim) => println!("  Embedding size: {}", dim),
        None => println!("  Embedding size: n/a"),
    }
    println!("  SHA-256: {}", DatasetManager::fingerprint(&encoded));
    for (label, count) in dataset.class_sizes() {
        println!("    {}: {} examples", label, count);
    }
    Ok(())
}

async fn train_command(manager: &DatasetManager, path: &Path, label: Label, images: &[PathBuf]) -> Result<()> {
    let store = ExampleStore::from_dataset(load_or_empty(manager, path).await?);
    let embedder = ColorHistogramEmbedder::default();

    for image in images {
        let frame = load_frame(image).with_context(|| format!("Failed to read {:?}", image))?;
        let vector = embedder.embed(&frame)?;
        store
            .add_example(label, vector)
            .with_context(|| format!("Failed to add {:?} under '{}'", image, label))?;
    }

    manager.save_to(path, &store.export_dataset()).await?;
    println!(
        "Added {} examples under '{}' ({} classes, saved to {})",
        images.len(),
        label,
        store.class_count(),
        path.display()
    );
    Ok(())
}

async fn recognize_command(
    manager: &DatasetManager,
    path: &Path,
    frames: &Path,
    config: RuntimeConfig,
) -> Result<()> {
    let dataset = manager
        .load_from(path)
        .await
        .with_context(|| format!("Failed to load dataset {:?}", path))?;

    config.validate()?;
    let mut recognizer = Recognizer::connect(
        ImageDirSource::open(frames),
        ColorHistogramEmbedder::default(),
        &config,
    )
    .await?;
    recognizer.store().import_dataset(dataset);

    let start_time = Instant::now();
    let mut results = recognizer.start_session().await?;
    info!("=== Recognizing (press Ctrl-C to stop) ===");

    loop {
        tokio::select! {
            result = results.recv() => match result {
                Some(result) => println!(
                    "[{:>2}] {} ({:.0}%)",
                    result.iteration,
                    result.label,
                    result.confidence() * 100.0
                ),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                recognizer.stop_session();
            }
        }
    }

    match recognizer.wait_session().await {
        Some(Ok(report)) => {
            info!("Session ended after {:.2?}", start_time.elapsed());
            println!("Stopped ({:?}) after {} predictions", report.reason, report.iterations);
            if let Some(last) = recognizer.last_prediction() {
                println!("Last letter detected: {}", last.label);
            }
            Ok(())
        }
        Some(Err(e)) => Err(e).context("Recognition session failed"),
        None => {
            warn!("No session outcome available");
            bail!("Recognition session did not start")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = RuntimeConfig::from_env()?;
    let manager = DatasetManager::new(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;
    let path = args.dataset.clone().unwrap_or_else(|| manager.dataset_path());

    match args.command {
        Command::Info => info_command(&manager, &path).await,
        Command::Train { label, images } => train_command(&manager, &path, label, &images).await,
        Command::Recognize {
            frames,
            k,
            metric,
            max_iterations,
        } => {
            let config = RuntimeConfig {
                k: k.unwrap_or(config.k),
                metric: metric.unwrap_or(config.metric),
                max_iterations: max_iterations.unwrap_or(config.max_iterations),
                ..config
            };
            recognize_command(&manager, &path, &frames, config).await
        }
    }
}
