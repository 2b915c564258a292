/*!
The synchronization engine: tree walker, staleness checker and compressor.

Every failure is caught at the scope it belongs to (one directory, one file),
logged with its path, and turned into an outcome. Nothing here ever aborts a
run.
*/

use std::fs::{self, File, FileType};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::artifact::{
    artifact_path, is_artifact, is_temp_file, Destination, FileSnapshot, Freshness,
};
use crate::compression::{CompressionAdapter, GzipCompressor, StreamStats};
use crate::config::{SymlinkPolicy, SyncConfig};
use crate::report::{FileOutcome, SyncReport};
use crate::{Result, SyncError};

/// A directory entry classified from its listing file type
#[derive(Debug)]
enum Entry {
    Directory(PathBuf),
    File(PathBuf),
    Skipped(PathBuf, &'static str),
}

/// Engine that keeps `F.gz` artifacts in sync with their sources
///
/// # Example
/// ```rust,no_run
/// use gzsync_core::{GzipCompressor, SyncConfig, SyncEngine};
///
/// let engine = SyncEngine::new(GzipCompressor::new(), SyncConfig::default());
/// let report = engine.run("/data");
/// assert!(!report.has_failures());
/// ```
pub struct SyncEngine<C>
where
    C: CompressionAdapter,
{
    compressor: C,
    config: SyncConfig,
}

impl<C> SyncEngine<C>
where
    C: CompressionAdapter,
{
    /// Create a new engine with the given compressor and configuration
    pub fn new(compressor: C, config: SyncConfig) -> Self {
        Self { compressor, config }
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronize every file under `root`
    ///
    /// Runs sequentially unless the configuration asks for more than one
    /// worker, in which case the same walk runs on a dedicated rayon pool.
    pub fn run<P: AsRef<Path>>(&self, root: P) -> SyncReport {
        let root = root.as_ref();

        if !self.config.is_parallel() {
            return self.walk(root);
        }

        let jobs = self.config.effective_jobs();
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => {
                debug!("Running with {} workers", jobs);
                pool.install(|| self.walk_parallel(root))
            }
            Err(e) => {
                warn!("Failed to start {} workers ({}), running sequentially", jobs, e);
                self.walk(root)
            }
        }
    }

    /// Walk `dir` depth-first, one entry at a time
    ///
    /// A subdirectory is fully processed before the next sibling is looked at.
    /// If `dir` cannot be listed the failure is logged and recorded, and the
    /// caller carries on with its own remaining entries.
    pub fn walk(&self, dir: &Path) -> SyncReport {
        let mut report = SyncReport::default();
        for entry in self.list(dir, &mut report) {
            report = report.merge(self.visit(entry, false));
        }
        report
    }

    fn walk_parallel(&self, dir: &Path) -> SyncReport {
        let mut report = SyncReport::default();
        let entries = self.list(dir, &mut report);

        entries
            .into_par_iter()
            .map(|entry| self.visit(entry, true))
            .reduce(SyncReport::default, SyncReport::merge)
            .merge(report)
    }

    fn visit(&self, entry: Entry, parallel: bool) -> SyncReport {
        match entry {
            Entry::Directory(path) if parallel => self.walk_parallel(&path),
            Entry::Directory(path) => self.walk(&path),
            Entry::File(path) => SyncReport::from_outcome(self.check_and_compress(&path)),
            Entry::Skipped(path, reason) => {
                debug!("Skipping {}: {}", path.display(), reason);
                SyncReport::from_outcome(FileOutcome::Skipped)
            }
        }
    }

    /// List and classify the direct entries of `dir`
    ///
    /// Entries yielded before a listing error are kept; everything after it
    /// is lost.
    fn list(&self, dir: &Path, report: &mut SyncReport) -> Vec<Entry> {
        info!("Scanning folder: {}", dir.display());

        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                error!("{}", SyncError::read_dir(dir, e));
                report.record_directory_failure();
                return Vec::new();
            }
        };
        report.record_directory();

        let mut entries = Vec::new();
        for entry in read_dir {
            let classified = entry.and_then(|entry| {
                let file_type = entry.file_type()?;
                Ok(self.classify(entry.path(), file_type))
            });

            match classified {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    error!("{}", SyncError::read_dir(dir, e));
                    report.record_directory_failure();
                    break;
                }
            }
        }
        entries
    }

    fn classify(&self, path: PathBuf, file_type: FileType) -> Entry {
        if file_type.is_dir() {
            Entry::Directory(path)
        } else if is_temp_file(&path) {
            Entry::Skipped(path, "temporary file")
        } else if is_artifact(&path) {
            Entry::Skipped(path, "compressed artifact")
        } else if file_type.is_symlink() && self.config.symlinks == SymlinkPolicy::Skip {
            Entry::Skipped(path, "symbolic link")
        } else {
            Entry::File(path)
        }
    }

    /// Decide whether `source` needs its artifact (re)written, and write it if so
    pub fn check_and_compress(&self, source: &Path) -> FileOutcome {
        let source_meta = match FileSnapshot::read(source) {
            Ok(meta) => meta,
            Err(e) => {
                error!("{}", SyncError::source_metadata(source, e));
                return FileOutcome::MetadataFailed;
            }
        };

        // Symlinks to directories and special files end up here under FollowFiles.
        if !source_meta.is_file {
            debug!("Not a regular file, skipping: {}", source.display());
            return FileOutcome::Skipped;
        }

        let artifact = artifact_path(source);
        // Any failure to stat the artifact counts as "absent".
        let artifact_meta = FileSnapshot::read(&artifact).ok();

        let freshness = Freshness::assess(&source_meta, artifact_meta.as_ref());
        if !freshness.needs_compression() {
            info!("Compressed file is up to date: {}", artifact.display());
            return FileOutcome::UpToDate;
        }

        match freshness {
            Freshness::Absent => {
                info!(
                    "Compressed file not found for: {}. Creating...",
                    source.display()
                );
                self.compress_logged(source, &artifact, FileOutcome::Created)
            }
            Freshness::Stale => {
                info!(
                    "Compressed file outdated for: {}. Recreating...",
                    source.display()
                );
                self.compress_logged(source, &artifact, FileOutcome::Recreated)
            }
            Freshness::Fresh => FileOutcome::UpToDate,
        }
    }

    fn compress_logged(
        &self,
        source: &Path,
        destination: &Path,
        on_success: fn(StreamStats) -> FileOutcome,
    ) -> FileOutcome {
        match self.compress(source, destination) {
            Ok(stats) => on_success(stats),
            Err(e) => {
                error!("{}", e);
                FileOutcome::CompressionFailed
            }
        }
    }

    /// Stream `source` through the compressor into `destination`
    ///
    /// Without atomic writes the destination is truncated before streaming
    /// begins, so a failure leaves a partial file behind.
    pub fn compress(&self, source: &Path, destination: &Path) -> Result<StreamStats> {
        info!("Starting compression for: {}", source.display());

        let stats = self
            .stream(source, destination)
            .map_err(|e| SyncError::compression(source, e))?;

        info!("Compression completed for: {}", source.display());
        debug!(
            "{}: {} bytes in, {} bytes out ({})",
            source.display(),
            stats.bytes_in,
            stats.bytes_out,
            self.compressor.algorithm_name()
        );
        Ok(stats)
    }

    fn stream(&self, source: &Path, destination: &Path) -> io::Result<StreamStats> {
        let file = File::open(source)?;
        let mut dest = if self.config.atomic {
            let permissions = file.metadata()?.permissions();
            Destination::atomic(destination, Some(permissions))?
        } else {
            Destination::direct(destination)?
        };

        let mut reader = BufReader::new(file);
        let stats = self.compressor.compress_stream(&mut reader, &mut dest)?;
        dest.commit()?;
        Ok(stats)
    }
}

/// Create an engine with the gzip compressor and the default, sequential configuration
pub fn create_default_engine() -> SyncEngine<GzipCompressor> {
    SyncEngine::new(GzipCompressor::new(), SyncConfig::default())
}

/// Create a gzip engine from a configuration, validating it first
pub fn create_engine_from_config(config: SyncConfig) -> Result<SyncEngine<GzipCompressor>> {
    config.validate()?;
    Ok(SyncEngine::new(GzipCompressor::with_level(config.level), config))
}
