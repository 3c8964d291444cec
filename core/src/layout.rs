//! Project layout conventions for generated test artifacts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which family of artifacts to discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Page-object classes holding locator fields.
    Pages,
    /// Step-definition classes holding Cucumber annotations.
    Steps,
}

/// Where page objects and step definitions live under a project root.
///
/// Directories are relative to the project root. A page file must contain
/// `page_file_marker` in its file name; a step file must end with
/// `step_file_suffix`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use suite_triage_core::{ArtifactKind, ArtifactLayout};
///
/// let layout = ArtifactLayout::default();
/// assert!(layout.accepts(ArtifactKind::Pages, Path::new("LoginPage.java")));
/// assert!(!layout.accepts(ArtifactKind::Pages, Path::new("BaseUtils.java")));
/// assert!(layout.accepts(ArtifactKind::Steps, Path::new("LoginSteps.java")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactLayout {
    pub pages_dir: PathBuf,
    pub steps_dir: PathBuf,
    pub page_file_marker: String,
    pub step_file_suffix: String,
    pub source_extension: String,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            pages_dir: PathBuf::from("src/main/java/org/example/pages"),
            steps_dir: PathBuf::from("src/test/java/org/example/stepdefinitions"),
            page_file_marker: "Page".to_string(),
            step_file_suffix: "Steps.java".to_string(),
            source_extension: "java".to_string(),
        }
    }
}

impl ArtifactLayout {
    /// Directory for `kind` resolved against `root`.
    pub fn dir_for(&self, root: &Path, kind: ArtifactKind) -> PathBuf {
        match kind {
            ArtifactKind::Pages => root.join(&self.pages_dir),
            ArtifactKind::Steps => root.join(&self.steps_dir),
        }
    }

    /// Returns `true` if the file name at `path` belongs to `kind`.
    pub fn accepts(&self, kind: ArtifactKind, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        match kind {
            ArtifactKind::Pages => {
                let has_ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e == self.source_extension);
                has_ext && file_name.contains(self.page_file_marker.as_str())
            }
            ArtifactKind::Steps => file_name.ends_with(self.step_file_suffix.as_str()),
        }
    }
}
