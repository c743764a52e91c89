use crossbeam_channel::{at, never, select, Receiver};

use crate::audio::domain::playback_options::PlaybackOptions;

use super::domain::play_state::PlayState;
use super::playback_controller::PlaybackController;

/// User requests delivered to the playback loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Play(PlaybackOptions),
    Stop,
    Shutdown,
}

/// Runs the controller on the calling thread until shutdown.
///
/// Commands and the completion deadline are multiplexed on one thread, so the
/// controller never sees concurrent calls. When `exit_when_idle` is set the
/// loop also returns once the controller is back in `NotPlaying`. A closed
/// command channel counts as shutdown.
pub fn run(controller: &mut PlaybackController, commands: &Receiver<Command>, exit_when_idle: bool) {
    loop {
        if exit_when_idle && controller.state() == PlayState::NotPlaying {
            break;
        }

        let deadline = match controller.next_deadline() {
            Some(instant) => at(instant),
            None => never(),
        };

        select! {
            recv(commands) -> command => match command {
                Ok(Command::Play(options)) => controller.play(options),
                Ok(Command::Stop) => controller.stop(),
                Ok(Command::Shutdown) | Err(_) => {
                    controller.stop();
                    break;
                }
            },
            recv(deadline) -> _ => {
                controller.tick();
            }
        }
    }
    log::debug!("Playback loop exited");
}
