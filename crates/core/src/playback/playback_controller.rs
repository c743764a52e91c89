use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::graph_builder::GraphBuilder;
use crate::audio::domain::playback_options::PlaybackOptions;
use crate::audio::domain::render_graph::RenderGraph;
use crate::audio::domain::source_reader::{SourceOpenError, SourceReader};
use crate::shared::constants::{AUDIO_ENGINE_ERROR, AUDIO_FILE_ERROR};

use super::completion_scheduler::CompletionScheduler;
use super::domain::play_state::PlayState;
use super::domain::playback_delegate::PlaybackDelegate;
use super::playback_engine::PlaybackEngine;

/// Plays one clip with a chosen effect combination and reports when it stops.
///
/// Owns the engine and the completion timer for its clip. Every failure path
/// leaves the controller in `NotPlaying`; the delegate hears about each state
/// transition exactly once.
pub struct PlaybackController {
    source: Arc<AudioSource>,
    builder: GraphBuilder,
    engine: PlaybackEngine,
    scheduler: CompletionScheduler,
    delegate: Box<dyn PlaybackDelegate>,
    state: PlayState,
    active_graph: Option<RenderGraph>,
}

impl PlaybackController {
    /// Opens the clip at `path`. On failure the delegate receives an
    /// "Audio File Error" alert and the error is returned.
    pub fn new(
        reader: &dyn SourceReader,
        path: &Path,
        engine: PlaybackEngine,
        scheduler: CompletionScheduler,
        mut delegate: Box<dyn PlaybackDelegate>,
    ) -> Result<Self, SourceOpenError> {
        match reader.open(path) {
            Ok(source) => Ok(Self::with_source(Arc::new(source), engine, scheduler, delegate)),
            Err(e) => {
                log::error!("Failed to open {}: {}", path.display(), e);
                delegate.notify_error(AUDIO_FILE_ERROR, &e.to_string());
                Err(e)
            }
        }
    }

    pub fn with_source(
        source: Arc<AudioSource>,
        engine: PlaybackEngine,
        scheduler: CompletionScheduler,
        delegate: Box<dyn PlaybackDelegate>,
    ) -> Self {
        Self {
            source,
            builder: GraphBuilder::new(),
            engine,
            scheduler,
            delegate,
            state: PlayState::NotPlaying,
            active_graph: None,
        }
    }

    /// Starts a new session, stopping the current one first.
    pub fn play(&mut self, options: PlaybackOptions) {
        if self.state == PlayState::Playing {
            self.stop();
        }

        let graph = self.builder.build(&options);
        match self.engine.start(&graph, Arc::clone(&self.source)) {
            Ok(()) => {
                let rendered = self.engine.rendered_samples();
                self.scheduler
                    .arm(&self.source, options.effective_rate() as f64, rendered);
                self.active_graph = Some(graph);
                log::info!("Playing with {:?}", options);
                self.transition(PlayState::Playing);
            }
            Err(e) => {
                log::error!("Audio engine failed to start: {}", e);
                self.delegate.notify_error(AUDIO_ENGINE_ERROR, &e.to_string());
            }
        }
    }

    /// Cancels the completion timer and halts rendering. Safe to call twice.
    pub fn stop(&mut self) {
        self.scheduler.cancel();
        self.engine.stop();
        self.active_graph = None;
        self.transition(PlayState::NotPlaying);
    }

    /// Checks the completion timer; when it fires, stops like `stop`.
    /// Returns true if the session finished on this tick.
    pub fn tick(&mut self) -> bool {
        if self.scheduler.poll().is_none() {
            return false;
        }
        log::info!("Playback finished");
        self.stop();
        true
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn active_graph(&self) -> Option<&RenderGraph> {
        self.active_graph.as_ref()
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    fn transition(&mut self, next: PlayState) {
        if self.state != next {
            self.state = next;
            self.delegate.notify_state(next);
        }
    }
}
