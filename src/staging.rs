use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::candidate::{CandidateId, PhotoRef};

/// Where staged photos are served from.
pub const PHOTO_ROOT: &str = "/photos";

/// A scratch directory holding copies of the candidates' photos for the life
/// of one election.
///
/// It is created fresh before the first candidate is registered and removed
/// once the election has concluded. Nothing in it is authoritative.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create the staging directory, replacing any stale one left by a
    /// previous run that did not shut down cleanly.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if dir.is_dir() {
            warn!("Removing stale staging directory {}", dir.display());
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        debug!("Created staging directory {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy a candidate's photo into the staging area.
    ///
    /// The staged file keeps the original file name unless another candidate
    /// has already claimed it, in which case it is prefixed with the
    /// candidate's ID.
    pub fn stage(&self, id: CandidateId, photo: &Path) -> Result<PhotoRef> {
        if !photo.is_file() {
            return Err(Error::Configuration(format!(
                "couldn't find a photo for candidate {id} at \"{}\"",
                photo.display()
            )));
        }
        let file_name = photo
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::Configuration(format!("invalid photo file name \"{}\"", photo.display()))
            })?;

        let mut staged_name = file_name.to_string();
        if self.dir.join(&staged_name).exists() {
            staged_name = format!("{id}-{file_name}");
        }
        fs::copy(photo, self.dir.join(&staged_name))?;
        debug!("Staged photo {} as {staged_name}", photo.display());
        Ok(PhotoRef(staged_name))
    }

    /// Delete the staging directory and everything in it.
    pub fn remove(&self) -> Result<()> {
        if self.dir.is_dir() {
            fs::remove_dir_all(&self.dir)?;
            debug!("Removed staging directory {}", self.dir.display());
        }
        Ok(())
    }
}

/// URL at which a staged photo is served.
pub fn photo_url(photo: &PhotoRef) -> String {
    format!("{PHOTO_ROOT}/{photo}")
}
