//! Test doubles for the playback ports.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::domain::clock::Clock;
use super::domain::output_device::{DeviceError, OutputDevice, RenderFn, RouteError, StreamFormat};
use super::domain::play_state::PlayState;
use super::domain::playback_delegate::PlaybackDelegate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceCall {
    Route,
    Start(StreamFormat),
    Stop,
}

#[derive(Default)]
struct StubState {
    calls: Vec<DeviceCall>,
    render: Option<RenderFn>,
    fail_start: bool,
    fail_route: bool,
}

/// In-memory output device. Clones share state, so a test can keep one
/// handle while the engine owns another.
#[derive(Clone, Default)]
pub struct StubOutputDevice {
    state: Arc<Mutex<StubState>>,
}

impl StubOutputDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_start() -> Self {
        let device = Self::default();
        device.state.lock().unwrap().fail_start = true;
        device
    }

    pub fn failing_route() -> Self {
        let device = Self::default();
        device.state.lock().unwrap().fail_route = true;
        device
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Drives the render callback as the hardware would.
    pub fn pull(&self, samples: usize) -> Vec<f32> {
        let mut out = vec![0.0; samples];
        if let Some(render) = self.state.lock().unwrap().render.as_mut() {
            render(out.as_mut_slice());
        }
        out
    }
}

impl OutputDevice for StubOutputDevice {
    fn route_to_speaker(&mut self) -> Result<(), RouteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DeviceCall::Route);
        if state.fail_route {
            return Err(RouteError::NotFound("speaker".to_string()));
        }
        Ok(())
    }

    fn start(&mut self, format: StreamFormat, render: RenderFn) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DeviceCall::Start(format));
        if state.fail_start {
            return Err(DeviceError::Play("device busy".to_string()));
        }
        state.render = Some(render);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        if state.render.take().is_some() {
            state.calls.push(DeviceCall::Stop);
        }
    }

    fn is_running(&self) -> bool {
        self.state.lock().unwrap().render.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DelegateEvent {
    State(PlayState),
    Error { title: String, message: String },
}

/// Records every delegate callback in order.
#[derive(Clone, Default)]
pub struct RecordingDelegate {
    events: Arc<Mutex<Vec<DelegateEvent>>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DelegateEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<PlayState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DelegateEvent::State(s) => Some(s),
                DelegateEvent::Error { .. } => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DelegateEvent::Error { title, message } => Some((title, message)),
                DelegateEvent::State(_) => None,
            })
            .collect()
    }
}

impl PlaybackDelegate for RecordingDelegate {
    fn notify_state(&mut self, state: PlayState) {
        self.events.lock().unwrap().push(DelegateEvent::State(state));
    }

    fn notify_error(&mut self, title: &str, message: &str) {
        self.events.lock().unwrap().push(DelegateEvent::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
