/*!
Derived artifact naming, freshness policy and artifact destinations.
*/

use std::ffi::OsString;
use std::fs::{self, File, Metadata, Permissions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;

use crate::config::{ARTIFACT_EXTENSION, TEMP_PREFIX, TEMP_SUFFIX};

/// Path of the artifact derived from `source`: the source path with `.gz` appended
///
/// No escaping is done, so `notes.txt` maps to `notes.txt.gz` and `x.gz`
/// maps to `x.gz.gz`.
pub fn artifact_path<P: AsRef<Path>>(source: P) -> PathBuf {
    let mut name: OsString = source.as_ref().as_os_str().to_owned();
    name.push(".");
    name.push(ARTIFACT_EXTENSION);
    PathBuf::from(name)
}

/// The source an artifact path would have been derived from: `x.gz` gives `x`
pub fn source_path<P: AsRef<Path>>(artifact: P) -> Option<PathBuf> {
    let artifact = artifact.as_ref();
    match artifact.extension() {
        Some(ext) if ext == ARTIFACT_EXTENSION => Some(artifact.with_extension("")),
        _ => None,
    }
}

/// Whether `path` names a derived artifact: it ends in `.gz` and a
/// non-directory entry with the stripped name sits next to it
///
/// A `.gz` file with no such source is an ordinary file and gets an artifact
/// of its own.
pub fn is_artifact<P: AsRef<Path>>(path: P) -> bool {
    source_path(path)
        .and_then(|source| fs::symlink_metadata(source).ok())
        .map_or(false, |meta| !meta.is_dir())
}

/// Whether `path` names a temp file left behind by an interrupted atomic write
pub fn is_temp_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| {
            name.len() > TEMP_PREFIX.len() + TEMP_SUFFIX.len()
                && name.starts_with(TEMP_PREFIX)
                && name.ends_with(TEMP_SUFFIX)
        })
}

/// Metadata captured for one path at one point in time
///
/// Snapshots are never cached: every decision reads fresh metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSnapshot {
    pub modified: SystemTime,
    pub is_file: bool,
}

impl FileSnapshot {
    /// Read metadata for `path`, following symlinks
    pub fn read<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::metadata(path).and_then(Self::try_from)
    }
}

impl TryFrom<Metadata> for FileSnapshot {
    type Error = io::Error;

    fn try_from(meta: Metadata) -> io::Result<Self> {
        Ok(Self {
            modified: meta.modified()?,
            is_file: meta.is_file(),
        })
    }
}

/// Outcome of comparing a source against its artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No artifact could be read; it must be created
    Absent,
    /// The source was modified after the artifact; it must be recreated
    Stale,
    /// The artifact is at least as new as the source
    Fresh,
}

impl Freshness {
    /// Decide what to do with an artifact given both snapshots
    ///
    /// `artifact` is `None` whenever the artifact's metadata could not be read,
    /// whatever the reason. Equal timestamps count as fresh.
    pub fn assess(source: &FileSnapshot, artifact: Option<&FileSnapshot>) -> Self {
        match artifact {
            None => Freshness::Absent,
            Some(artifact) if source.modified > artifact.modified => Freshness::Stale,
            Some(_) => Freshness::Fresh,
        }
    }

    /// Whether the artifact has to be (re)written
    pub fn needs_compression(self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

/// Open write target for an artifact
///
/// `Direct` truncates the final path up front, so a failed stream leaves a
/// partial artifact behind. `Atomic` writes to a temp file next to the final
/// path and only renames it into place on `commit`; dropping it uncommitted
/// removes the temp file.
pub enum Destination {
    Direct(BufWriter<File>),
    Atomic {
        file: BufWriter<NamedTempFile>,
        target: PathBuf,
    },
}

impl Destination {
    /// Create or truncate `target` for writing
    pub fn direct<P: AsRef<Path>>(target: P) -> io::Result<Self> {
        Ok(Destination::Direct(BufWriter::new(File::create(target)?)))
    }

    /// Create a temp file in `target`'s directory
    ///
    /// Temp files are created owner-only; pass the source's permissions to
    /// give the artifact the same mode once it is renamed into place.
    pub fn atomic<P: AsRef<Path>>(target: P, permissions: Option<Permissions>) -> io::Result<Self> {
        let target = target.as_ref();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        if let Some(permissions) = permissions {
            temp.as_file().set_permissions(permissions)?;
        }

        Ok(Destination::Atomic {
            file: BufWriter::new(temp),
            target: target.to_path_buf(),
        })
    }

    /// Flush everything and make the artifact visible at its final path
    pub fn commit(self) -> io::Result<()> {
        match self {
            Destination::Direct(mut file) => {
                file.flush()?;
                Ok(())
            }
            Destination::Atomic { file, target } => {
                let temp = file.into_inner().map_err(|e| e.into_error())?;
                temp.persist(&target).map_err(|e| e.error)?;
                Ok(())
            }
        }
    }
}

impl Write for Destination {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Destination::Direct(file) => file.write(buf),
            Destination::Atomic { file, .. } => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Destination::Direct(file) => file.flush(),
            Destination::Atomic { file, .. } => file.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn snapshot(secs: u64) -> FileSnapshot {
        FileSnapshot {
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
            is_file: true,
        }
    }

    #[test]
    fn test_artifact_path_appends_extension() {
        assert_eq!(artifact_path("/data/a.txt"), PathBuf::from("/data/a.txt.gz"));
        assert_eq!(artifact_path("relative/Makefile"), PathBuf::from("relative/Makefile.gz"));
        assert_eq!(artifact_path("x.gz"), PathBuf::from("x.gz.gz"));
    }

    #[test]
    fn test_source_path_strips_extension() {
        assert_eq!(source_path("/data/a.txt.gz"), Some(PathBuf::from("/data/a.txt")));
        assert_eq!(source_path("x.gz.gz"), Some(PathBuf::from("x.gz")));
        assert_eq!(source_path("/data/a.txt"), None);
        assert_eq!(source_path("/data/a.tgz"), None);
    }

    #[test]
    fn test_gz_file_is_artifact_only_next_to_its_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        let standalone = temp_dir.path().join("backup.gz");
        fs::write(&source, b"a").unwrap();
        fs::write(artifact_path(&source), b"compressed a").unwrap();
        fs::write(&standalone, b"user archive").unwrap();

        assert!(is_artifact(artifact_path(&source)));
        assert!(!is_artifact(&standalone));
        assert!(!is_artifact(&source));
        assert!(is_artifact(artifact_path(&standalone)));

        fs::create_dir(temp_dir.path().join("logs")).unwrap();
        fs::write(temp_dir.path().join("logs.gz"), b"x").unwrap();
        assert!(!is_artifact(temp_dir.path().join("logs.gz")));
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file("/data/.gzsync-abc123.tmp"));
        assert!(!is_temp_file("/data/.gzsync-.tmp"));
        assert!(!is_temp_file("/data/gzsync-abc123.tmp"));
        assert!(!is_temp_file("/data/.gzsync-abc123.tmp.gz"));
        assert!(!is_temp_file("/data/notes.tmp"));
    }

    #[test]
    fn test_missing_artifact_is_absent() {
        assert_eq!(Freshness::assess(&snapshot(100), None), Freshness::Absent);
        assert!(Freshness::Absent.needs_compression());
    }

    #[test]
    fn test_newer_source_is_stale() {
        assert_eq!(
            Freshness::assess(&snapshot(101), Some(&snapshot(100))),
            Freshness::Stale
        );
        assert!(Freshness::Stale.needs_compression());
    }

    #[test]
    fn test_equal_timestamps_are_fresh() {
        assert_eq!(
            Freshness::assess(&snapshot(100), Some(&snapshot(100))),
            Freshness::Fresh
        );
        assert!(!Freshness::Fresh.needs_compression());
    }

    #[test]
    fn test_older_source_is_fresh() {
        assert_eq!(
            Freshness::assess(&snapshot(99), Some(&snapshot(100))),
            Freshness::Fresh
        );
    }

    #[test]
    fn test_snapshot_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.txt");
        fs::write(&path, b"12345").unwrap();

        let snap = FileSnapshot::read(&path).unwrap();
        assert!(snap.is_file);
        assert!(!FileSnapshot::read(temp_dir.path()).unwrap().is_file);
        assert!(FileSnapshot::read(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_direct_destination_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a.txt.gz");
        fs::write(&target, b"old contents that are longer").unwrap();

        let mut dest = Destination::direct(&target).unwrap();
        dest.write_all(b"new").unwrap();
        dest.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_atomic_destination_only_appears_on_commit() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a.txt.gz");
        fs::write(&target, b"previous").unwrap();

        let mut dest = Destination::atomic(&target, None).unwrap();
        dest.write_all(b"replacement").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"previous");

        dest.commit().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"replacement");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_atomic_destination_dropped_leaves_no_trace() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a.txt.gz");

        {
            let mut dest = Destination::atomic(&target, None).unwrap();
            dest.write_all(b"partial").unwrap();
        }

        assert!(!target.exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
