use std::mem;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::classification::domain::batch_summary::BatchSummary;
use crate::classification::domain::image_analysis::ImageAnalysis;
use crate::classification::domain::label::ClassificationLabel;
use crate::imaging::domain::thumbnail_renderer::ThumbnailRenderer;
use crate::pipeline::batch_logger::{BatchLogger, NullBatchLogger};
use crate::pipeline::image_analyzer::ImageAnalyzer;
use crate::storage::domain::batch::{Batch, BatchId};
use crate::storage::domain::storage_error::StorageError;
use crate::storage::infrastructure::batch_store::BatchStore;

#[derive(Error, Debug)]
pub enum BatchError {
    /// The batch's own artifacts could not be written; it must not be
    /// reported as completed.
    #[error("failed to persist batch results: {0}")]
    Persist(#[source] StorageError),
    #[error("batch storage error: {0}")]
    Storage(#[source] StorageError),
    #[error("batch run already finished")]
    AlreadyFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Created,
    Running,
    Completed,
    Failed,
}

/// Emitted once per processed file, success or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// 1-based position of the file in processing order.
    pub index: usize,
    pub total: usize,
    /// `floor(index * 100 / total)`.
    pub percent: usize,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<ClassificationLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Terminal payload of a batch run, available once both artifacts are on
/// disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub batch_id: BatchId,
    pub summary: BatchSummary,
    pub results: Vec<ImageAnalysis>,
    pub results_path: PathBuf,
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Progress(ProgressEvent),
    Completed(BatchOutcome),
}

/// Classifies every image of a batch, strictly one file at a time.
///
/// Files are processed in file-name order so progress numbering is
/// reproducible. A failing file yields an error event and is left out of the
/// summary and the stored results; the batch carries on. Results are only
/// persisted after the last file, so abandoning a run leaves no artifacts.
pub struct ClassifyBatchUseCase {
    analyzer: Box<dyn ImageAnalyzer>,
    store: BatchStore,
    thumbnails: Option<Box<dyn ThumbnailRenderer>>,
    logger: Box<dyn BatchLogger>,
}

impl ClassifyBatchUseCase {
    pub fn new(analyzer: Box<dyn ImageAnalyzer>, store: BatchStore) -> Self {
        Self {
            analyzer,
            store,
            thumbnails: None,
            logger: Box::new(NullBatchLogger),
        }
    }

    pub fn with_thumbnails(mut self, renderer: Box<dyn ThumbnailRenderer>) -> Self {
        self.thumbnails = Some(renderer);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn BatchLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn store(&self) -> &BatchStore {
        &self.store
    }

    /// Starts a run over `files`. Nothing happens until the returned
    /// iterator is polled.
    pub fn run<'a>(&'a mut self, batch: &'a Batch, mut files: Vec<PathBuf>) -> BatchRun<'a> {
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
        BatchRun {
            use_case: self,
            batch,
            files,
            next_index: 0,
            results: Vec::new(),
            state: BatchState::Created,
        }
    }

    /// Starts a run over the source files already ingested into `batch`.
    pub fn run_stored<'a>(&'a mut self, batch: &'a Batch) -> Result<BatchRun<'a>, BatchError> {
        let files = self.store.source_files(batch).map_err(BatchError::Storage)?;
        Ok(self.run(batch, files))
    }

    /// Drives a run to completion, discarding progress events.
    pub fn execute(&mut self, batch: &Batch, files: Vec<PathBuf>) -> Result<BatchOutcome, BatchError> {
        self.run(batch, files).finish()
    }

    fn render_thumbnail(&mut self, batch: &Batch, analysis: &ImageAnalysis) {
        let Some(renderer) = self.thumbnails.as_ref() else {
            return;
        };
        let started = Instant::now();
        let dest = self.store.thumbnail_path(batch, analysis.path());
        if let Err(e) = renderer.render(analysis.path(), analysis.faces(), &dest) {
            log::warn!("Thumbnail for {} failed: {e}", analysis.path().display());
        }
        self.logger
            .timing("thumbnail", started.elapsed().as_secs_f64() * 1000.0);
    }
}

/// A batch run in progress: yields one [`BatchEvent::Progress`] per file and
/// then exactly one terminal item, the completion event or the persistence
/// error.
pub struct BatchRun<'a> {
    use_case: &'a mut ClassifyBatchUseCase,
    batch: &'a Batch,
    files: Vec<PathBuf>,
    next_index: usize,
    results: Vec<ImageAnalysis>,
    state: BatchState,
}

impl BatchRun<'_> {
    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    /// Consumes the remaining events and returns the terminal outcome.
    pub fn finish(self) -> Result<BatchOutcome, BatchError> {
        for event in self {
            if let BatchEvent::Completed(outcome) = event? {
                return Ok(outcome);
            }
        }
        Err(BatchError::AlreadyFinished)
    }

    fn process_next(&mut self) -> ProgressEvent {
        let path = self.files[self.next_index].clone();
        self.next_index += 1;
        let index = self.next_index;
        let total = self.files.len();

        let started = Instant::now();
        let analyzed = self.use_case.analyzer.analyze(&path);
        self.use_case
            .logger
            .timing("analyze", started.elapsed().as_secs_f64() * 1000.0);

        let mut event = ProgressEvent {
            index,
            total,
            percent: index * 100 / total,
            filename: file_name(&path),
            label: None,
            distance: None,
            error: None,
        };
        match analyzed {
            Ok(analysis) => {
                event.label = Some(analysis.classification().label);
                event.distance = analysis.classification().distance;
                self.use_case.render_thumbnail(self.batch, &analysis);
                self.results.push(analysis);
            }
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                event.error = Some(e.to_string());
            }
        }
        self.use_case.logger.progress(index, total);
        event
    }

    fn complete(&mut self) -> Result<BatchOutcome, BatchError> {
        let results = mem::take(&mut self.results);
        let summary = BatchSummary::from_results(&results);

        let started = Instant::now();
        let artifacts = self
            .use_case
            .store
            .persist(self.batch, &results, &summary)
            .map_err(BatchError::Persist)?;
        self.use_case
            .logger
            .timing("persist", started.elapsed().as_secs_f64() * 1000.0);

        Ok(BatchOutcome {
            batch_id: self.batch.id().clone(),
            summary,
            results,
            results_path: artifacts.results_path,
            csv_path: artifacts.csv_path,
        })
    }
}

impl Iterator for BatchRun<'_> {
    type Item = Result<BatchEvent, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            BatchState::Completed | BatchState::Failed => return None,
            BatchState::Created => {
                self.state = BatchState::Running;
                self.use_case.logger.info(&format!(
                    "Classifying {} image(s) in batch {}",
                    self.files.len(),
                    self.batch.id()
                ));
            }
            BatchState::Running => {}
        }

        if self.next_index < self.files.len() {
            return Some(Ok(BatchEvent::Progress(self.process_next())));
        }

        let outcome = self.complete();
        self.state = if outcome.is_ok() {
            BatchState::Completed
        } else {
            BatchState::Failed
        };
        self.use_case.logger.summary();
        Some(outcome.map(BatchEvent::Completed))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::classification_result::ClassificationResult;
    use crate::classification::domain::pair_classifier::PairClassifier;
    use crate::pipeline::image_analyzer::AnalysisError;
    use crate::shared::constants::RESULTS_JSON;
    use crate::shared::error::BoxError;
    use crate::shared::face_box::FaceBox;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // --- Stubs ---

    /// Files named `bad*` fail; everything else gets the configured distance
    /// (or no face when none is configured).
    struct StubAnalyzer {
        distances: HashMap<String, f64>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ImageAnalyzer for StubAnalyzer {
        fn analyze(&mut self, path: &Path) -> Result<ImageAnalysis, AnalysisError> {
            let name = file_name(path);
            self.calls.lock().unwrap().push(name.clone());
            if name.starts_with("bad") {
                return Err(AnalysisError::SourceNotFound(path.to_path_buf()));
            }
            let (faces, classification) = match self.distances.get(&name) {
                Some(&d) => (
                    vec![FaceBox::new(0, 4, 4, 0), FaceBox::new(0, 9, 4, 5)],
                    PairClassifier::default().classify_distance(d),
                ),
                None => (Vec::new(), ClassificationResult::no_face()),
            };
            let count = faces.len();
            Ok(ImageAnalysis::new(path.to_path_buf(), faces, count, classification))
        }
    }

    struct StubRenderer {
        rendered: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    impl ThumbnailRenderer for StubRenderer {
        fn render(&self, _source: &Path, _faces: &[FaceBox], dest: &Path) -> Result<(), BoxError> {
            self.rendered.lock().unwrap().push(dest.to_path_buf());
            if self.fail {
                return Err("disk full".into());
            }
            Ok(())
        }
    }

    struct Harness {
        _root: TempDir,
        store: BatchStore,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let store = BatchStore::new(root.path().join("uploads"));
            Self {
                _root: root,
                store,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn use_case(&self, distances: &[(&str, f64)]) -> ClassifyBatchUseCase {
            let analyzer = StubAnalyzer {
                distances: distances
                    .iter()
                    .map(|(name, d)| (name.to_string(), *d))
                    .collect(),
                calls: self.calls.clone(),
            };
            ClassifyBatchUseCase::new(Box::new(analyzer), self.store.clone())
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/in").join(n)).collect()
    }

    fn progress(events: &[BatchEvent]) -> Vec<&ProgressEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                BatchEvent::Progress(p) => Some(p),
                BatchEvent::Completed(_) => None,
            })
            .collect()
    }

    // --- Tests ---

    #[test]
    fn test_empty_batch_completes_immediately() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let mut use_case = harness.use_case(&[]);

        let events: Vec<BatchEvent> = use_case
            .run(&batch, Vec::new())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(events.len(), 1);
        let BatchEvent::Completed(outcome) = &events[0] else {
            panic!("expected completion, got {:?}", events[0]);
        };
        assert_eq!(outcome.summary.total, 0);
        assert!(outcome.summary.counts.is_empty());
        assert_eq!(outcome.summary.mean_distance, None);
        assert_eq!(outcome.summary.median_distance, None);
        assert!(outcome.results_path.is_file());
    }

    #[test]
    fn test_failed_file_is_reported_and_excluded() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let mut use_case = harness.use_case(&[("good.jpg", 0.3)]);

        let events: Vec<BatchEvent> = use_case
            .run(&batch, paths(&["good.jpg", "bad.jpg"]))
            .collect::<Result<_, _>>()
            .unwrap();

        let progress = progress(&events);
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].filename, "bad.jpg");
        assert!(progress[0].is_error());
        assert_eq!(progress[0].label, None);
        assert_eq!(progress[1].filename, "good.jpg");
        assert_eq!(progress[1].label, Some(ClassificationLabel::Twins));
        assert_eq!(progress[1].distance, Some(0.3));
        assert_eq!(progress[1].error, None);

        let Some(BatchEvent::Completed(outcome)) = events.last() else {
            panic!("missing completion event");
        };
        assert_eq!(outcome.summary.total, 1);
        assert_eq!(outcome.summary.count(ClassificationLabel::Twins), 1);
        assert_eq!(outcome.results.len(), 1);

        let stored = harness.store.load_results(&batch).unwrap().unwrap();
        assert_eq!(stored.results.len(), 1);
        assert_eq!(stored.results[0].file_name(), "good.jpg");
        assert_eq!(stored.summary, outcome.summary);
    }

    #[test]
    fn test_files_processed_in_name_order() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let mut use_case = harness.use_case(&[]);
        let files = vec![
            PathBuf::from("/z/a.jpg"),
            PathBuf::from("/a/c.jpg"),
            PathBuf::from("/m/b.jpg"),
        ];

        let events: Vec<BatchEvent> = use_case
            .run(&batch, files)
            .collect::<Result<_, _>>()
            .unwrap();

        let progress = progress(&events);
        let seen: Vec<(usize, usize, &str)> = progress
            .iter()
            .map(|p| (p.index, p.percent, p.filename.as_str()))
            .collect();
        assert_eq!(seen, vec![(1, 33, "a.jpg"), (2, 66, "b.jpg"), (3, 100, "c.jpg")]);
        assert!(progress.iter().all(|p| p.total == 3));
        assert_eq!(*harness.calls.lock().unwrap(), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_run_is_lazy_and_abandoning_persists_nothing() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let mut use_case = harness.use_case(&[]);

        {
            let mut run = use_case.run(&batch, paths(&["a.jpg", "b.jpg"]));
            assert_eq!(run.state(), BatchState::Created);
            assert!(harness.calls.lock().unwrap().is_empty());

            assert!(matches!(run.next(), Some(Ok(BatchEvent::Progress(_)))));
            assert_eq!(run.state(), BatchState::Running);
        }

        assert_eq!(harness.calls.lock().unwrap().len(), 1);
        assert!(!batch.dir().join(RESULTS_JSON).exists());
        assert!(harness.store.load_results(&batch).unwrap().is_none());
    }

    #[test]
    fn test_state_reaches_completed_and_stream_ends() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let mut use_case = harness.use_case(&[]);
        let mut run = use_case.run(&batch, paths(&["a.jpg"]));

        assert!(matches!(run.next(), Some(Ok(BatchEvent::Progress(_)))));
        assert!(matches!(run.next(), Some(Ok(BatchEvent::Completed(_)))));
        assert_eq!(run.state(), BatchState::Completed);
        assert!(run.next().is_none());
    }

    #[test]
    fn test_persist_failure_fails_the_batch() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        fs::remove_dir_all(batch.dir()).unwrap();
        let mut use_case = harness.use_case(&[]);
        let mut run = use_case.run(&batch, paths(&["a.jpg"]));

        assert!(matches!(run.next(), Some(Ok(BatchEvent::Progress(_)))));
        assert!(matches!(run.next(), Some(Err(BatchError::Persist(_)))));
        assert_eq!(run.state(), BatchState::Failed);
        assert!(run.next().is_none());
    }

    #[test]
    fn test_finish_after_completion() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let mut use_case = harness.use_case(&[]);
        let mut run = use_case.run(&batch, Vec::new());

        assert!(matches!(run.next(), Some(Ok(BatchEvent::Completed(_)))));
        assert!(matches!(run.finish(), Err(BatchError::AlreadyFinished)));
    }

    #[test]
    fn test_execute_returns_outcome() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let mut use_case = harness.use_case(&[("a.jpg", 0.2), ("b.jpg", 0.5), ("c.jpg", 0.9)]);

        let outcome = use_case
            .execute(&batch, paths(&["c.jpg", "b.jpg", "a.jpg", "d.jpg"]))
            .unwrap();

        assert_eq!(&outcome.batch_id, batch.id());
        assert_eq!(outcome.summary.total, 4);
        assert_eq!(outcome.summary.count(ClassificationLabel::NoFace), 1);
        assert_eq!(outcome.summary.median_distance, Some(0.5));
        assert!(outcome.csv_path.is_file());
    }

    #[test]
    fn test_run_stored_uses_ingested_files() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        fs::write(batch.dir().join("b.jpg"), b"x").unwrap();
        fs::write(batch.dir().join("a.jpg"), b"x").unwrap();
        let mut use_case = harness.use_case(&[]);

        let outcome = use_case.run_stored(&batch).unwrap().finish().unwrap();

        assert_eq!(outcome.summary.total, 2);
        assert_eq!(*harness.calls.lock().unwrap(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_thumbnails_are_best_effort() {
        let harness = Harness::new();
        let batch = harness.store.allocate().unwrap();
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let mut use_case = harness
            .use_case(&[("pair.jpg", 0.45)])
            .with_thumbnails(Box::new(StubRenderer {
                rendered: rendered.clone(),
                fail: true,
            }));

        let outcome = use_case
            .execute(&batch, paths(&["pair.jpg", "bad.jpg"]))
            .unwrap();

        assert_eq!(outcome.summary.count(ClassificationLabel::Siblings), 1);
        assert_eq!(
            *rendered.lock().unwrap(),
            vec![batch.dir().join("thumbs").join("pair.jpg.thumb.jpg")]
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = BatchEvent::Progress(ProgressEvent {
            index: 1,
            total: 2,
            percent: 50,
            filename: "a.jpg".into(),
            label: Some(ClassificationLabel::Similar),
            distance: Some(0.58),
            error: None,
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "event": "progress",
                "index": 1,
                "total": 2,
                "percent": 50,
                "filename": "a.jpg",
                "label": "similar",
                "distance": 0.58
            })
        );
    }
}
