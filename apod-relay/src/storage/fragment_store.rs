use crate::relay::RelayError;
use apod_core::TrackIndex;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Writes uploaded fragments as numbered files, one sequence per track.
///
/// Sequences keep counting when the save directory changes.
pub struct FragmentStore {
    save_dir: RwLock<PathBuf>,
    sequences: DashMap<TrackIndex, u64>,
}

impl FragmentStore {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: RwLock::new(save_dir.into()),
            sequences: DashMap::new(),
        }
    }

    pub fn save_dir(&self) -> PathBuf {
        match self.save_dir.read() {
            Ok(dir) => dir.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_save_dir(&self, dir: PathBuf) {
        info!("Saving fragments to {}", dir.display());
        match self.save_dir.write() {
            Ok(mut current) => *current = dir,
            Err(poisoned) => *poisoned.into_inner() = dir,
        }
    }

    /// Reserve the file name of the next fragment of `track`.
    pub fn next_path(&self, track: TrackIndex) -> PathBuf {
        let seq = {
            let mut next = self.sequences.entry(track).or_insert(0);
            let seq = *next;
            *next += 1;
            seq
        };
        fragment_path(&self.save_dir(), track, seq)
    }

    pub async fn store(&self, track: TrackIndex, fragment: Bytes) -> Result<PathBuf, RelayError> {
        let path = self.next_path(track);
        let write = |source| RelayError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write)?;
        }
        tokio::fs::write(&path, &fragment).await.map_err(write)?;

        debug!("Stored {} bytes at {}", fragment.len(), path.display());
        Ok(path)
    }
}

pub fn fragment_path(dir: &Path, track: TrackIndex, seq: u64) -> PathBuf {
    dir.join(format!("track{}_{:06}.webm", track, seq))
}
