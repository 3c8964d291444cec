//! Artifact discovery: turning a project root into [`SourceArtifact`] lists.
//!
//! The duplication checker consumes already-materialized artifacts; this
//! module is the seam that walks the filesystem (or an in-memory fixture) and
//! records read failures alongside successful reads.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use suite_triage_core::{ArtifactKind, ArtifactLayout, SourceArtifact};
use tracing::{debug, info, warn};

/// Typed error for artifact discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Filesystem I/O failure while walking a directory.
    #[error("IO error walking {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project root does not exist or is not a directory.
    #[error("project root '{0}' is not a directory")]
    InvalidRoot(PathBuf),
}

/// Provides the artifacts of one family for a scan.
pub trait ArtifactSource {
    /// Returns artifacts of `kind` in a stable order.
    fn discover(&self, kind: ArtifactKind) -> Result<Vec<SourceArtifact>, DiscoverError>;
}

/// Discovers artifacts under a project root following an [`ArtifactLayout`].
#[derive(Debug, Clone)]
pub struct FsArtifactSource {
    root: PathBuf,
    layout: ArtifactLayout,
}

impl FsArtifactSource {
    /// Creates a source rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoverError::InvalidRoot`] when `root` is not a directory.
    pub fn new(root: impl Into<PathBuf>, layout: ArtifactLayout) -> Result<Self, DiscoverError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DiscoverError::InvalidRoot(root));
        }
        Ok(Self { root, layout })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Directory scanned for `kind`.
    pub fn dir_for(&self, kind: ArtifactKind) -> PathBuf {
        self.layout.dir_for(&self.root, kind)
    }
}

impl ArtifactSource for FsArtifactSource {
    fn discover(&self, kind: ArtifactKind) -> Result<Vec<SourceArtifact>, DiscoverError> {
        let dir = self.dir_for(kind);
        if !dir.is_dir() {
            debug!(dir = %dir.display(), ?kind, "Artifact directory absent, nothing to scan");
            return Ok(Vec::new());
        }

        let mut paths = BTreeSet::new();
        collect_files(&dir, &mut paths)?;
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .filter(|path| self.layout.accepts(kind, path))
            .collect();

        // Reads run in parallel; collect() keeps the sorted path order.
        let artifacts: Vec<SourceArtifact> = paths.par_iter().map(|path| read_artifact(path)).collect();

        info!(dir = %dir.display(), ?kind, count = artifacts.len(), "Discovered artifacts");
        Ok(artifacts)
    }
}

/// Collects regular files under `dir`.
///
/// Symlinked directories are not followed. Only a failure to list `dir`
/// itself is an error; unreadable subdirectories are skipped.
fn collect_files(dir: &Path, out: &mut BTreeSet<PathBuf>) -> Result<(), DiscoverError> {
    let entries = fs::read_dir(dir).map_err(|source| DiscoverError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    collect_entries(dir, entries, out);
    Ok(())
}

fn collect_entries(dir: &Path, entries: fs::ReadDir, out: &mut BTreeSet<PathBuf>) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            warn!(path = %path.display(), "Skipping entry with unknown file type");
            continue;
        };

        if file_type.is_dir() {
            match fs::read_dir(&path) {
                Ok(children) => collect_entries(&path, children, out),
                Err(err) => {
                    warn!(dir = %path.display(), error = %err, "Skipping unreadable directory");
                }
            }
        } else if file_type.is_symlink() {
            if path.is_dir() {
                debug!(path = %path.display(), "Not following directory symlink");
            } else {
                out.insert(path);
            }
        } else {
            out.insert(path);
        }
    }
}

fn read_artifact(path: &Path) -> SourceArtifact {
    match fs::read_to_string(path) {
        Ok(text) => SourceArtifact::loaded(path, text),
        Err(err) if err.kind() == ErrorKind::NotFound => SourceArtifact::missing(path),
        Err(err) => SourceArtifact::unreadable(path, err.to_string()),
    }
}

/// In-memory artifact source, mostly for tests and embedding callers.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::discover::{ArtifactSource, MemoryArtifactSource};
/// use suite_triage_core::{ArtifactKind, SourceArtifact};
///
/// let source = MemoryArtifactSource::default()
///     .with_page(SourceArtifact::loaded("LoginPage.java", "class LoginPage {}"));
/// assert_eq!(source.discover(ArtifactKind::Pages).unwrap().len(), 1);
/// assert!(source.discover(ArtifactKind::Steps).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactSource {
    pub pages: Vec<SourceArtifact>,
    pub steps: Vec<SourceArtifact>,
}

impl MemoryArtifactSource {
    pub fn with_page(mut self, artifact: SourceArtifact) -> Self {
        self.pages.push(artifact);
        self
    }

    pub fn with_step(mut self, artifact: SourceArtifact) -> Self {
        self.steps.push(artifact);
        self
    }
}

impl ArtifactSource for MemoryArtifactSource {
    fn discover(&self, kind: ArtifactKind) -> Result<Vec<SourceArtifact>, DiscoverError> {
        Ok(match kind {
            ArtifactKind::Pages => self.pages.clone(),
            ArtifactKind::Steps => self.steps.clone(),
        })
    }
}
