use std::path::Path;

use super::audio_source::AudioSource;

/// Domain interface for persisting a captured clip to disk.
pub trait SourceWriter: Send {
    fn write(&self, path: &Path, audio: &AudioSource) -> Result<(), Box<dyn std::error::Error>>;
}
