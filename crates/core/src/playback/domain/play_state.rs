use std::fmt;

/// Transport state reported to the delegate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    NotPlaying,
    Playing,
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::NotPlaying => write!(f, "not playing"),
            PlayState::Playing => write!(f, "playing"),
        }
    }
}
