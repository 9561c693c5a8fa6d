use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::classification::domain::batch_summary::BatchSummary;
use crate::classification::domain::image_analysis::ImageAnalysis;
use crate::shared::constants::{BATCH_PREFIX, RESULTS_CSV, RESULTS_JSON, THUMBS_DIR};
use crate::storage::domain::batch::{Batch, BatchId};
use crate::storage::domain::results_document::ResultsDocument;
use crate::storage::domain::storage_error::StorageError;
use crate::storage::infrastructure::csv_export;

/// Paths of the two artifacts written for a completed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifacts {
    pub results_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Outcome of an expiry scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

#[derive(Serialize)]
struct ResultsDocumentRef<'a> {
    results: &'a [ImageAnalysis],
    summary: &'a BatchSummary,
}

/// Disk-backed batch storage under a shared root directory.
///
/// Each batch owns one subdirectory of the root exclusively. Nothing is
/// locked: concurrent batches never touch each other's directories and the
/// expiry scan keys off last-modified time.
#[derive(Debug, Clone)]
pub struct BatchStore {
    root: PathBuf,
}

impl BatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn batch_dir(&self, id: &BatchId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Creates a fresh, uniquely named batch directory.
    ///
    /// The name is a random suffix created with exclusive semantics, so an
    /// existing batch is never reused or overwritten.
    pub fn allocate(&self) -> Result<Batch, StorageError> {
        fs::create_dir_all(&self.root).map_err(StorageError::io(&self.root))?;
        let dir = tempfile::Builder::new()
            .prefix(BATCH_PREFIX)
            .rand_bytes(10)
            .tempdir_in(&self.root)
            .map_err(StorageError::io(&self.root))?
            .keep();

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = BatchId::parse(&name)?;
        log::info!("Allocated batch {id} at {}", dir.display());
        Ok(Batch::new(id, dir, SystemTime::now()))
    }

    /// Reopens an existing batch by id.
    pub fn open(&self, id: &BatchId) -> Result<Batch, StorageError> {
        let dir = self.batch_dir(id);
        let metadata = match fs::metadata(&dir) {
            Ok(m) if m.is_dir() => m,
            Ok(_) => return Err(StorageError::BatchNotFound(id.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::BatchNotFound(id.to_string()))
            }
            Err(e) => return Err(StorageError::io(&dir)(e)),
        };
        let created_at = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or_else(|_| SystemTime::now());
        Ok(Batch::new(id.clone(), dir, created_at))
    }

    /// Copies source files into the batch directory, flattened to their file
    /// names. Returns the copied paths in input order.
    pub fn ingest(&self, batch: &Batch, sources: &[PathBuf]) -> Result<Vec<PathBuf>, StorageError> {
        let mut copied = Vec::with_capacity(sources.len());
        for source in sources {
            let Some(name) = source.file_name().filter(|n| !n.is_empty()) else {
                log::warn!("Skipping source without a file name: {}", source.display());
                continue;
            };
            let dest = batch.dir().join(name);
            if dest.exists() {
                return Err(StorageError::DuplicateSource(
                    name.to_string_lossy().into_owned(),
                ));
            }
            fs::copy(source, &dest).map_err(StorageError::io(source))?;
            copied.push(dest);
        }
        Ok(copied)
    }

    /// Regular source files in the batch directory, sorted by file name.
    ///
    /// Result artifacts, thumbnails and hidden files are excluded.
    pub fn source_files(&self, batch: &Batch) -> Result<Vec<PathBuf>, StorageError> {
        let entries = fs::read_dir(batch.dir()).map_err(StorageError::io(batch.dir()))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StorageError::io(batch.dir()))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || name == RESULTS_JSON || name == RESULTS_CSV {
                continue;
            }
            let is_file = entry
                .file_type()
                .map_err(StorageError::io(entry.path()))?
                .is_file();
            if is_file {
                files.push(entry.path());
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    pub fn thumbnail_path(&self, batch: &Batch, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        batch.dir().join(THUMBS_DIR).join(format!("{name}.thumb.jpg"))
    }

    /// Writes `results.csv` then `results.json`, each through a temporary file
    /// renamed into place. The JSON document appearing marks the batch
    /// complete.
    pub fn persist(
        &self,
        batch: &Batch,
        results: &[ImageAnalysis],
        summary: &BatchSummary,
    ) -> Result<PersistedArtifacts, StorageError> {
        let csv_path = batch.dir().join(RESULTS_CSV);
        write_atomically(batch.dir(), &csv_path, |out| {
            csv_export::write_csv(out, results).map_err(StorageError::io(&csv_path))
        })?;

        let results_path = batch.dir().join(RESULTS_JSON);
        let document = ResultsDocumentRef { results, summary };
        write_atomically(batch.dir(), &results_path, |out| {
            serde_json::to_writer_pretty(&mut *out, &document)?;
            out.flush().map_err(StorageError::io(&results_path))
        })?;

        log::info!(
            "Persisted {} result(s) for batch {}",
            results.len(),
            batch.id()
        );
        Ok(PersistedArtifacts {
            results_path,
            csv_path,
        })
    }

    /// Reads the results document of a completed batch.
    ///
    /// `None` means the batch is not ready: the document is missing or could
    /// not be parsed.
    pub fn load_results(&self, batch: &Batch) -> Result<Option<ResultsDocument>, StorageError> {
        let path = batch.dir().join(RESULTS_JSON);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&path)(e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                log::warn!("Ignoring unreadable results at {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    /// Deletes every batch directory whose last modification is older than
    /// `max_age`. Failures are logged and the scan continues.
    pub fn purge_expired(&self, max_age: Duration) -> PurgeReport {
        let mut report = PurgeReport::default();
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return report;
        };
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return report,
            Err(e) => {
                log::warn!("Cannot scan {}: {e}", self.root.display());
                return report;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let modified = match entry.metadata() {
                Ok(m) if m.is_dir() => m.modified(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };
            match modified {
                Ok(modified) if modified < cutoff => match fs::remove_dir_all(&path) {
                    Ok(()) => {
                        log::info!("Purged expired batch {}", path.display());
                        report.removed.push(path);
                    }
                    Err(e) => {
                        log::warn!("Failed to purge {}: {e}", path.display());
                        report.failed.push(path);
                    }
                },
                Ok(_) => {}
                Err(e) => log::warn!("Cannot stat {}: {e}", path.display()),
            }
        }
        report
    }

    /// Deletes one batch regardless of age. Returns whether it existed.
    pub fn reset(&self, id: &BatchId) -> Result<bool, StorageError> {
        let dir = self.batch_dir(id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                log::info!("Reset batch {id}");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(&dir)(e)),
        }
    }
}

fn write_atomically<F>(dir: &Path, dest: &Path, write: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut BufWriter<&mut fs::File>) -> Result<(), StorageError>,
{
    let mut tmp = NamedTempFile::new_in(dir).map_err(StorageError::io(dir))?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out)?;
        out.flush().map_err(StorageError::io(dest))?;
    }
    tmp.persist(dest)
        .map_err(|e| StorageError::io(dest)(e.error))?;
    Ok(())
}
