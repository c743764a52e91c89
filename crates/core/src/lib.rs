pub mod audio;
pub mod playback;
pub mod recording;
pub mod shared;
