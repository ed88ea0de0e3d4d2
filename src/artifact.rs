//! Persistence of diff artifacts.
//!
//! Each artifact gets a fresh `vt_diff_<uuid>.png` name so concurrent
//! comparisons writing into the same directory never overwrite each other.

use crate::image::io::save_png;
use crate::image::OwnedImage;
use crate::trace::trace_span;
use crate::util::{VtError, VtResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Environment variable overriding the default artifact directory.
pub const ARTIFACT_DIR_ENV: &str = "VTSDK_ARTIFACT_DIR";

/// Directory that receives diff artifacts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Uses `VTSDK_ARTIFACT_DIR` when set and non-empty, else the system temp dir.
    pub fn from_env() -> Self {
        match std::env::var_os(ARTIFACT_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(std::env::temp_dir()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns a new, unique artifact path inside the store.
    pub fn next_path(&self) -> PathBuf {
        self.dir
            .join(format!("vt_diff_{}.png", Uuid::new_v4().simple()))
    }

    /// Writes `img` as PNG under a fresh name and returns its path.
    pub fn persist(&self, img: &OwnedImage) -> VtResult<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|err| {
            VtError::InternalFailure(format!(
                "creating artifact dir {}: {err}",
                self.dir.display()
            ))
        })?;
        let path = self.next_path();
        let _span = trace_span!("persist_artifact", path = %path.display()).entered();
        save_png(img, &path)?;
        Ok(path)
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::from_env()
    }
}
