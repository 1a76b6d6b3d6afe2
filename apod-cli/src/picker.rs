use apod_relay::SaveDirPicker;
use async_trait::async_trait;
use dialoguer::Input;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Asks the operator on the relay's terminal.
pub struct PromptSaveDir;

#[async_trait]
impl SaveDirPicker for PromptSaveDir {
    async fn pick(&self, current: &Path) -> Option<PathBuf> {
        let initial = current.display().to_string();

        let answer = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt("Save recordings to")
                .with_initial_text(initial)
                .interact_text()
        })
        .await;

        match answer {
            Ok(Ok(dir)) if !dir.trim().is_empty() => Some(PathBuf::from(dir.trim())),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!("Save directory prompt failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Save directory prompt task failed: {}", e);
                None
            }
        }
    }
}
