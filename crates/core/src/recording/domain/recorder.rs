use std::path::{Path, PathBuf};

use crate::shared::constants::{
    AUDIO_RECORDER_ERROR, AUDIO_RECORDING_ERROR, AUDIO_SESSION_ERROR, RECORDING_DISABLED_MESSAGE,
    RECORDING_DISABLED_TITLE, RECORDING_FAILED_MESSAGE, RECORDING_FAILED_TITLE,
};

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Permission to record not granted")]
    PermissionDenied,
    #[error("Could not access audio features: {0}")]
    Unavailable(String),
    #[error("recorder has not been initialized")]
    NotInitialized,
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("failed to save recording: {0}")]
    Write(String),
}

impl RecorderError {
    /// Title and message to show the user for this failure.
    pub fn alert(&self) -> (&'static str, String) {
        match self {
            RecorderError::PermissionDenied => {
                (RECORDING_DISABLED_TITLE, RECORDING_DISABLED_MESSAGE.to_string())
            }
            RecorderError::Unavailable(_) => (AUDIO_SESSION_ERROR, self.to_string()),
            RecorderError::NotInitialized => (AUDIO_RECORDER_ERROR, self.to_string()),
            RecorderError::Capture(_) => (AUDIO_RECORDING_ERROR, self.to_string()),
            RecorderError::Write(_) => (RECORDING_FAILED_TITLE, RECORDING_FAILED_MESSAGE.to_string()),
        }
    }
}

/// Called once when `initialize` has finished probing the input device.
pub type ReadyCallback = Box<dyn FnOnce(Result<(), RecorderError>) + Send>;

/// Domain interface for capturing a clip from the microphone.
pub trait Recorder {
    fn initialize(&mut self, on_ready: ReadyCallback);

    fn record(&mut self) -> Result<(), RecorderError>;

    /// Ends capture, saves the clip and returns where it was written.
    fn stop_recording(&mut self) -> Result<PathBuf, RecorderError>;

    /// Path of the last saved clip.
    fn current_file(&self) -> Option<&Path>;
}
