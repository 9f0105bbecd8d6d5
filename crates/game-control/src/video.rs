//! Screen recording via `adb screenrecord`
//!
//! The recording runs as a device-side process owned by a spawned adb
//! child; stopping kills the child, pulls the file off the device and
//! rotates old recordings.

use crate::config::RecordingConfig;
use crate::error::ControlError;
use adb_transport::{AdbTransport, TransportError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Child;

/// Device-side path for the in-progress recording
const REMOTE_RECORDING: &str = "/sdcard/recording_temp.mp4";

/// Manages one screen recording at a time
pub struct VideoCapture {
    output_dir: PathBuf,
    max_folder_bytes: u64,
    child: Option<Child>,
    current_file: Option<PathBuf>,
}

impl VideoCapture {
    pub fn new(config: &RecordingConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            max_folder_bytes: config.max_folder_bytes,
            child: None,
            current_file: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.child.is_some()
    }

    /// Start recording the device screen
    pub async fn start(
        &mut self,
        transport: &AdbTransport,
        filename: &str,
    ) -> Result<(), ControlError> {
        if self.child.is_some() {
            return Err(TransportError::AlreadyRecording.into());
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let child = transport.start_screenrecord(REMOTE_RECORDING)?;
        self.child = Some(child);
        self.current_file = Some(self.output_dir.join(filename));
        tracing::info!("Started screen recording to {}", filename);
        Ok(())
    }

    /// Stop recording and pull the file from the device
    ///
    /// Returns the local path of the pulled recording.
    pub async fn stop(&mut self, transport: &AdbTransport) -> Result<PathBuf, ControlError> {
        let mut child = self.child.take().ok_or(TransportError::NotRecording)?;
        let local = self
            .current_file
            .take()
            .ok_or(TransportError::NotRecording)?;

        // Terminating the adb child stops the device-side screenrecord
        if let Err(e) = child.kill().await {
            tracing::warn!("Failed to kill recording process: {}", e);
        }
        let _ = child.wait().await;

        // Give the device a moment to finalize the file
        tokio::time::sleep(Duration::from_secs(1)).await;

        transport.pull(REMOTE_RECORDING, &local).await?;
        if let Err(e) = transport.rm(REMOTE_RECORDING).await {
            tracing::warn!("Failed to remove device recording: {}", e);
        }

        rotate_old_recordings(&self.output_dir, self.max_folder_bytes).await?;

        tracing::info!("Screen recording saved to {:?}", local);
        Ok(local)
    }

    /// Abort an in-progress recording without pulling the file
    pub async fn abort(&mut self, transport: &AdbTransport) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
            let _ = child.wait().await;
            let _ = transport.rm(REMOTE_RECORDING).await;
            self.current_file = None;
            tracing::info!("Aborted screen recording");
        }
    }
}

/// Delete oldest recordings while the directory exceeds `max_bytes`
pub async fn rotate_old_recordings(dir: &Path, max_bytes: u64) -> Result<(), ControlError> {
    let mut files = Vec::new();
    let mut total: u64 = 0;

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified()?;
        total += meta.len();
        files.push((entry.path(), modified, meta.len()));
    }

    if total <= max_bytes {
        return Ok(());
    }

    // Oldest first
    files.sort_by_key(|(_, modified, _)| *modified);

    for (path, _, len) in files {
        if total <= max_bytes {
            break;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                total -= len;
                tracing::info!("Rotated old recording: {:?}", path);
            }
            Err(e) => tracing::warn!("Failed to delete old recording {:?}: {}", path, e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rotation_deletes_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        for (name, age_secs) in [("old.mp4", 30u64), ("mid.mp4", 20), ("new.mp4", 10)] {
            let path = dir.path().join(name);
            std::fs::write(&path, vec![0u8; 100]).unwrap();
            let mtime = std::time::SystemTime::now() - Duration::from_secs(age_secs);
            let file = std::fs::File::options().write(true).open(&path).unwrap();
            file.set_modified(mtime).unwrap();
        }

        // Budget fits two files: only the oldest goes
        rotate_old_recordings(dir.path(), 200).await.unwrap();

        assert!(!dir.path().join("old.mp4").exists());
        assert!(dir.path().join("mid.mp4").exists());
        assert!(dir.path().join("new.mp4").exists());
    }

    #[tokio::test]
    async fn test_rotation_under_budget_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), vec![0u8; 50]).unwrap();
        rotate_old_recordings(dir.path(), 1000).await.unwrap();
        assert!(dir.path().join("a.mp4").exists());
    }

    #[tokio::test]
    async fn test_rotation_missing_dir_is_ok() {
        rotate_old_recordings(Path::new("/nonexistent/records"), 100)
            .await
            .unwrap();
    }
}
