use super::play_state::PlayState;

/// Receives state changes and titled error alerts from the playback controller.
///
/// Called synchronously on the controller's thread.
pub trait PlaybackDelegate {
    fn notify_state(&mut self, state: PlayState);
    fn notify_error(&mut self, title: &str, message: &str);
}
