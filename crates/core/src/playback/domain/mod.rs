pub mod clock;
pub mod output_device;
pub mod play_state;
pub mod playback_delegate;
