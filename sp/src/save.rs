//! Local save effect
//!
//! Hands a rendered deck to the user's environment. The workflow does not
//! wait on the user or treat a failed save as a failed commit; it only records
//! where the environment says the file went.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::{debug, info};

/// Persists or offers a binary payload under a file name
pub trait SaveEffect: Send + Sync {
    /// Returns the location the payload was written to
    fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf>;
}

/// Writes payloads into a directory on the local filesystem
pub struct FileSaver {
    dir: PathBuf,
}

impl FileSaver {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl SaveEffect for FileSaver {
    fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        debug!(dir = %self.dir.display(), %filename, bytes = data.len(), "FileSaver::save: called");
        fs::create_dir_all(&self.dir).context(format!("Failed to create output directory: {}", self.dir.display()))?;

        let path = self.dir.join(filename);
        // Write beside the target and rename so a reader never sees a partial deck
        let partial = self.dir.join(format!(".{}.partial", filename));
        fs::write(&partial, data).context(format!("Failed to write {}", partial.display()))?;
        fs::rename(&partial, &path).context(format!("Failed to move deck into place: {}", path.display()))?;

        info!(path = %path.display(), bytes = data.len(), "Saved presentation");
        Ok(path)
    }
}
