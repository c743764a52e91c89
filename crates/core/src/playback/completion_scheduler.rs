use std::time::{Duration, Instant};

use crate::audio::domain::audio_source::AudioSource;

use super::domain::clock::Clock;

/// Wall-clock time left until the last source frame has been rendered.
///
/// `(total - already_rendered) / sample_rate / rate`. A non-positive or
/// non-finite rate counts as 1.0; a zero sample rate yields zero.
pub fn remaining_duration(source: &AudioSource, rate_factor: f64, already_rendered: u64) -> Duration {
    if source.sample_rate() == 0 {
        return Duration::ZERO;
    }
    let rate = if rate_factor.is_finite() && rate_factor > 0.0 {
        rate_factor
    } else {
        1.0
    };
    let remaining = source.total_sample_length().saturating_sub(already_rendered);
    Duration::from_secs_f64(remaining as f64 / source.sample_rate() as f64 / rate)
}

/// Identifies one armed completion timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerHandle(u64);

struct ArmedTimer {
    handle: TimerHandle,
    deadline: Instant,
    duration: Duration,
}

/// One-shot completion timer.
///
/// The deadline is computed once when armed and never re-estimated. The
/// owning event loop waits on `next_deadline` and calls `poll`, which fires
/// the timer at most once.
pub struct CompletionScheduler {
    clock: Box<dyn Clock>,
    armed: Option<ArmedTimer>,
    next_id: u64,
}

impl CompletionScheduler {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            armed: None,
            next_id: 0,
        }
    }

    /// Arms the timer for the remaining playback time, replacing any timer
    /// already armed.
    pub fn arm(&mut self, source: &AudioSource, rate_factor: f64, already_rendered: u64) -> TimerHandle {
        let duration = remaining_duration(source, rate_factor, already_rendered);
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        log::debug!("Completion timer {:?} armed for {:.3}s", handle, duration.as_secs_f64());
        self.armed = Some(ArmedTimer {
            handle,
            deadline: self.clock.now() + duration,
            duration,
        });
        handle
    }

    /// Disarms the timer. Returns true if one was armed.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(timer) => {
                log::debug!("Completion timer {:?} cancelled", timer.handle);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn armed_duration(&self) -> Option<Duration> {
        self.armed.as_ref().map(|t| t.duration)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|t| t.deadline)
    }

    /// Fires the timer if its deadline has passed. Returns the fired handle.
    pub fn poll(&mut self) -> Option<TimerHandle> {
        let due = self
            .armed
            .as_ref()
            .is_some_and(|t| self.clock.now() >= t.deadline);
        if !due {
            return None;
        }
        self.armed.take().map(|t| {
            log::debug!("Completion timer {:?} fired", t.handle);
            t.handle
        })
    }
}
