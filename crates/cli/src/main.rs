mod labels;
mod output;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgGroup, Parser};
use walkdir::WalkDir;

use twins_core::classification::domain::batch_summary::BatchSummary;
use twins_core::classification::domain::group_classifier::GroupClassifier;
use twins_core::classification::domain::image_analysis::ImageAnalysis;
use twins_core::detection::infrastructure::onnx_arcface_embedder::OnnxArcFaceEmbedder;
use twins_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use twins_core::imaging::infrastructure::image_file_loader::ImageFileLoader;
use twins_core::imaging::infrastructure::image_thumbnail_renderer::ImageThumbnailRenderer;
use twins_core::pipeline::analyze_image_use_case::AnalyzeImageUseCase;
use twins_core::pipeline::batch_logger::LogBatchLogger;
use twins_core::pipeline::classify_batch_use_case::{BatchEvent, BatchOutcome, ClassifyBatchUseCase};
use twins_core::shared::config::AppConfig;
use twins_core::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, IMAGE_EXTENSIONS, THUMBNAIL_SIZE, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};
use twins_core::shared::error::BoxError;
use twins_core::shared::model_resolver;
use twins_core::storage::domain::batch::BatchId;
use twins_core::storage::infrastructure::batch_store::BatchStore;

use crate::labels::Lang;

/// Classify face pairs in photos as twins, siblings, look-alikes or strangers.
#[derive(Parser)]
#[command(name = "twins")]
#[command(group(ArgGroup::new("input").required(true).args(["image", "folder", "reset"])))]
struct Cli {
    /// Analyze a single image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Analyze every image under a folder (recursive).
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Delete a stored batch and exit.
    #[arg(long, value_name = "BATCH_ID")]
    reset: Option<String>,

    /// Also write the JSON results to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Indent JSON output.
    #[arg(long)]
    pretty: bool,

    /// One line per image: label, distance, faces, path.
    #[arg(long)]
    brief: bool,

    /// Print per-label counts and distance statistics.
    #[arg(long)]
    summary: bool,

    /// Display language for labels: en or ja.
    #[arg(long, default_value = "en")]
    lang: String,

    /// Store inputs and results in a new batch under the storage root.
    #[arg(long, conflicts_with = "reset")]
    batch: bool,

    /// Render annotated thumbnails into the batch (requires --batch).
    #[arg(long, requires = "batch")]
    thumbnails: bool,

    /// Directory holding all batches.
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Settings file (defaults to the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upper distance bound for twins.
    #[arg(long)]
    twins: Option<f64>,

    /// Upper distance bound for siblings.
    #[arg(long)]
    siblings: Option<f64>,

    /// Upper distance bound for similar.
    #[arg(long)]
    similar: Option<f64>,

    /// Hours a batch is kept before it is purged.
    #[arg(long)]
    retention_hours: Option<u64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let lang = validate(&cli)?;
    let config = effective_config(&cli)?;

    let store = BatchStore::new(config.storage_root());
    let purged = store.purge_expired(config.retention());
    if !purged.removed.is_empty() {
        log::info!("Purged {} expired batch(es)", purged.removed.len());
    }

    if let Some(raw) = &cli.reset {
        let id = BatchId::parse(raw)?;
        if store.reset(&id)? {
            eprintln!("Deleted batch {id}");
        } else {
            eprintln!("No batch named {id}");
        }
        return Ok(());
    }

    let inputs = match (&cli.image, &cli.folder) {
        (Some(image), _) => vec![image.clone()],
        (None, Some(folder)) => collect_images(folder)?,
        (None, None) => return Err("one of --image, --folder or --reset is required".into()),
    };
    log::info!("Found {} image(s)", inputs.len());

    let mut analyzer = build_analyzer(&config)?;

    let (results, summary) = if cli.batch {
        let thumbnails = cli.thumbnails || config.thumbnails;
        let outcome = run_batch(analyzer, store, &inputs, thumbnails, lang)?;
        eprintln!(
            "Batch {} complete: {}",
            outcome.batch_id,
            outcome.results_path.display()
        );
        (outcome.results, outcome.summary)
    } else {
        let mut results = Vec::with_capacity(inputs.len());
        for path in &inputs {
            match analyzer.execute(path) {
                Ok(analysis) => results.push(analysis),
                // a single image is all-or-nothing; folders skip bad files
                Err(e) if cli.image.is_some() => return Err(e.into()),
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        }
        let summary = BatchSummary::from_results(&results);
        (results, summary)
    };

    print_results(&cli, lang, &results, &summary)
}

fn run_batch(
    analyzer: AnalyzeImageUseCase,
    store: BatchStore,
    inputs: &[PathBuf],
    thumbnails: bool,
    lang: Lang,
) -> Result<BatchOutcome, Box<dyn std::error::Error>> {
    let batch = store.allocate()?;
    store.ingest(&batch, inputs)?;
    eprintln!("Batch {}", batch.id());

    let mut use_case = ClassifyBatchUseCase::new(Box::new(analyzer), store)
        .with_logger(Box::new(LogBatchLogger::default()));
    if thumbnails {
        use_case = use_case.with_thumbnails(Box::new(ImageThumbnailRenderer::new(THUMBNAIL_SIZE)));
    }

    for event in use_case.run_stored(&batch)? {
        match event? {
            BatchEvent::Progress(progress) => eprintln!("{}", output::render_progress(&progress, lang)),
            BatchEvent::Completed(outcome) => return Ok(outcome),
        }
    }
    Err("batch ended without completing".into())
}

fn print_results(
    cli: &Cli,
    lang: Lang,
    results: &[ImageAnalysis],
    summary: &BatchSummary,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = output::render_json(results, lang, cli.pretty)?;
    if cli.brief {
        if !results.is_empty() {
            println!("{}", output::render_brief(results, lang));
        }
    } else {
        println!("{json}");
    }
    if let Some(path) = &cli.output {
        fs::write(path, &json)?;
        log::info!("Results written to {}", path.display());
    }

    if cli.summary {
        println!("\n{}", output::render_summary(summary, lang));
    }
    Ok(())
}

fn build_analyzer(config: &AppConfig) -> Result<AnalyzeImageUseCase, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let detector_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        None,
        Some(Box::new(|d, t| download_progress("face detection", d, t))),
    )?;
    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let embedder_path = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        None,
        Some(Box::new(|d, t| download_progress("face embedding", d, t))),
    )?;

    let detector = OnnxYoloDetector::new(&detector_path, config.confidence).map_err(widen)?;
    let embedder = OnnxArcFaceEmbedder::new(&embedder_path).map_err(widen)?;
    Ok(AnalyzeImageUseCase::new(
        Box::new(ImageFileLoader::new()),
        Box::new(detector),
        Box::new(embedder),
        GroupClassifier::new(config.thresholds),
    ))
}

fn widen(e: BoxError) -> Box<dyn std::error::Error> {
    e
}

/// Loads the settings file and applies command-line overrides on top.
fn effective_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(twins) = cli.twins {
        config.thresholds.twins = twins;
    }
    if let Some(siblings) = cli.siblings {
        config.thresholds.siblings = siblings;
    }
    if let Some(similar) = cli.similar {
        config.thresholds.similar = similar;
    }
    if let Some(hours) = cli.retention_hours {
        config.retention_hours = hours;
    }
    if let Some(root) = &cli.storage_root {
        config.storage_root = Some(root.clone());
    }
    if let Some(confidence) = cli.confidence {
        config.confidence = confidence;
    }
    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<Lang, Box<dyn std::error::Error>> {
    if let Some(image) = &cli.image {
        if !image.is_file() {
            return Err(format!("Input file not found: {}", image.display()).into());
        }
    }
    if let Some(folder) = &cli.folder {
        if !folder.is_dir() {
            return Err(format!("Input folder not found: {}", folder.display()).into());
        }
    }
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(format!("Confidence must be between 0.0 and 1.0, got {confidence}").into());
        }
    }
    Lang::parse(&cli.lang)
        .ok_or_else(|| format!("Language must be 'en' or 'ja', got '{}'", cli.lang).into())
}

/// Every supported image under `folder`, sorted by path.
fn collect_images(folder: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut images = Vec::new();
    for entry in WalkDir::new(folder).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(what: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {what} model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {what} model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("twins").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_input_is_required_and_exclusive() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--image", "a.jpg", "--folder", "dir"]).is_err());
        assert!(parse(&["--reset", "twins_x", "--batch"]).is_err());
        assert!(parse(&["--folder", "dir", "--thumbnails"]).is_err());
        assert!(parse(&["--folder", "dir", "--batch", "--thumbnails"]).is_ok());
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("a.jpg");
        fs::write(&image, b"x").unwrap();
        let image_arg = image.to_str().unwrap();
        let dir_arg = dir.path().to_str().unwrap();

        let cli = parse(&["--image", image_arg, "--lang", "ja"]).unwrap();
        assert_eq!(validate(&cli).unwrap(), Lang::Ja);

        let cli = parse(&["--folder", dir_arg]).unwrap();
        assert_eq!(validate(&cli).unwrap(), Lang::En);

        let cli = parse(&["--image", dir_arg]).unwrap();
        assert!(validate(&cli).is_err());

        let cli = parse(&["--folder", image_arg]).unwrap();
        assert!(validate(&cli).is_err());

        let cli = parse(&["--image", image_arg, "--lang", "fr"]).unwrap();
        assert!(validate(&cli).is_err());

        let cli = parse(&["--image", image_arg, "--confidence", "1.5"]).unwrap();
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_overrides_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"retention_hours": 2}"#).unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = parse(&["--reset", "x", "--config", config_arg, "--twins", "0.3"]).unwrap();
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.retention_hours, 2);
        assert_eq!(config.thresholds.twins, 0.3);

        let cli = parse(&["--reset", "x", "--config", config_arg, "--twins", "0.58"]).unwrap();
        assert!(effective_config(&cli).is_err());
    }

    #[test]
    fn test_collect_images_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "nested/c.webp", "nested/raw"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let found: Vec<PathBuf> = collect_images(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.JPG"),
                PathBuf::from("nested/c.webp"),
            ]
        );
    }
}
