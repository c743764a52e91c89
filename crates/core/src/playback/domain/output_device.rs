/// Layout of the samples handed to the device: the source's own rate and
/// channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Fills the buffer with interleaved samples in the session's `StreamFormat`.
/// Runs on the device's real-time callback thread.
pub type RenderFn = Box<dyn FnMut(&mut [f32]) + Send>;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no output device available")]
    NoDevice,
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to build output stream: {0}")]
    Build(String),
    #[error("failed to start output stream: {0}")]
    Play(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("failed to enumerate output devices: {0}")]
    Enumerate(String),
    #[error("no output device matching '{0}'")]
    NotFound(String),
}

/// Domain interface for the hardware output sink.
pub trait OutputDevice {
    /// Selects the loudspeaker route for the next `start`. Failure leaves the
    /// default route in place.
    fn route_to_speaker(&mut self) -> Result<(), RouteError>;

    fn start(&mut self, format: StreamFormat, render: RenderFn) -> Result<(), DeviceError>;

    /// Stops rendering and releases the stream. No-op when already stopped.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}
