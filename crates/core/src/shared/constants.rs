pub const APP_DIR_NAME: &str = "PitchPlay";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const DEFAULT_RECORDING_FILENAME: &str = "recording.wav";

/// Substring matched against output device names when routing to the loudspeaker.
pub const DEFAULT_OUTPUT_DEVICE: &str = "speaker";

pub const AUDIO_FILE_ERROR: &str = "Audio File Error";
pub const AUDIO_ENGINE_ERROR: &str = "Audio Engine Error";
pub const AUDIO_SESSION_ERROR: &str = "Audio Session Error";
pub const AUDIO_RECORDER_ERROR: &str = "Audio Recorder Error";
pub const AUDIO_RECORDING_ERROR: &str = "Audio Recording Error";

pub const RECORDING_DISABLED_TITLE: &str = "Recording Disabled";
pub const RECORDING_DISABLED_MESSAGE: &str =
    "You've disabled this app from recording your microphone. Check Settings.";
pub const RECORDING_FAILED_TITLE: &str = "Recording Failed";
pub const RECORDING_FAILED_MESSAGE: &str = "Something went wrong with your recording.";
