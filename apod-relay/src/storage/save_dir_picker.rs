use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Chooses a new save directory when a client sends `pick-savedir`.
///
/// `None` keeps the current directory.
#[async_trait]
pub trait SaveDirPicker: Send + Sync {
    async fn pick(&self, current: &Path) -> Option<PathBuf>;
}

/// Picker for unattended relays: never changes the directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSaveDir;

#[async_trait]
impl SaveDirPicker for FixedSaveDir {
    async fn pick(&self, _current: &Path) -> Option<PathBuf> {
        None
    }
}
