use std::path::{Path, PathBuf};

use thiserror::Error;

use super::audio_source::AudioSource;

#[derive(Error, Debug)]
pub enum SourceOpenError {
    #[error("audio file not found: {0}")]
    NotFound(PathBuf),
    #[error("no audio track in {0}")]
    NoAudioTrack(PathBuf),
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// Domain interface for opening a recorded clip as a playable source.
pub trait SourceReader {
    /// Decode the whole clip at its native sample rate.
    fn open(&self, path: &Path) -> Result<AudioSource, SourceOpenError>;
}
