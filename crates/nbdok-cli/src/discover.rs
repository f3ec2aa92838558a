//! Project file discovery
//!
//! Paths are returned relative to the project root and sorted. Anything
//! under a hidden directory or `.ipynb_checkpoints` is ignored.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use tracing::{debug, warn};

/// Notebook file extension
pub const NOTEBOOK_EXT: &str = "ipynb";
/// Source file extension
pub const SOURCE_EXT: &str = "py";

const CHECKPOINTS_DIR: &str = ".ipynb_checkpoints";

/// Files nbdok works on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFiles {
    /// All notebooks
    pub notebooks: Vec<PathBuf>,
    /// Sources with a sibling notebook, generated from it
    pub generated_sources: Vec<PathBuf>,
    /// Sources written by hand
    pub pure_sources: Vec<PathBuf>,
}

impl ProjectFiles {
    /// Discover the files below `root`
    pub fn discover(root: &Path) -> Result<Self> {
        let notebooks = find(root, NOTEBOOK_EXT)?;
        let (generated_sources, pure_sources) = find(root, SOURCE_EXT)?
            .into_iter()
            .partition(|path| root.join(path.with_extension(NOTEBOOK_EXT)).exists());

        Ok(Self {
            notebooks,
            generated_sources,
            pure_sources,
        })
    }
}

/// Check if a relative path passes through a hidden or checkpoint directory
pub fn is_ignored(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || name == CHECKPOINTS_DIR
        }
        _ => false,
    })
}

/// Strip the project root from a path yielded by glob.
///
/// glob drops leading `.` components, so `./a.ipynb` under root `.` comes
/// back as `a.ipynb`; the root is matched without them as well.
pub fn relative_to_root<'a>(path: &'a Path, root: &Path) -> Option<&'a Path> {
    if let Ok(relative) = path.strip_prefix(root) {
        return Some(relative);
    }
    let normalized: PathBuf = root
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    path.strip_prefix(&normalized).ok()
}

/// Relative path with `/` separators, as written into generated files
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn find(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{}",
        Pattern::escape(&root.display().to_string()),
        extension
    );

    let mut found = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Could not read {}", e);
                continue;
            }
        };
        let Some(relative) = relative_to_root(&path, root) else {
            debug!("Outside of {}: {}", root.display(), path.display());
            continue;
        };
        if path.is_file() && !is_ignored(relative) {
            found.push(relative.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}
