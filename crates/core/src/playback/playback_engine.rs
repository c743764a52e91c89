use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::render_graph::RenderGraph;
use crate::audio::infrastructure::processor_factory;

use super::domain::output_device::{DeviceError, OutputDevice, StreamFormat};
use super::render_chain::{RenderChain, Renderer};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to wire render graph: {0}")]
    Wiring(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

struct ActiveSession {
    rendered: Arc<AtomicU64>,
    node_count: usize,
}

/// Owns the output device and the render chain of the current session.
///
/// At most one chain is alive at a time: `start` tears down whatever was
/// running before wiring the new graph, and `stop` releases every stage so the
/// next `start` begins from a clean graph.
pub struct PlaybackEngine {
    device: Box<dyn OutputDevice>,
    session: Option<ActiveSession>,
}

impl PlaybackEngine {
    pub fn new(device: Box<dyn OutputDevice>) -> Self {
        Self {
            device,
            session: None,
        }
    }

    /// Wires `graph` over `source` and starts hardware rendering.
    ///
    /// The loudspeaker route is requested first; if that fails rendering
    /// proceeds on the default route.
    pub fn start(&mut self, graph: &RenderGraph, source: Arc<AudioSource>) -> Result<(), EngineError> {
        self.stop();

        if source.sample_rate() == 0 {
            return Err(EngineError::Wiring("source has a sample rate of 0".to_string()));
        }
        let chain = RenderChain::new(processor_factory::instantiate(
            graph,
            source.sample_rate(),
            source.channels(),
        ));
        if chain.is_empty() {
            return Err(EngineError::Wiring("render graph has no nodes".to_string()));
        }
        let node_count = chain.len();

        if let Err(e) = self.device.route_to_speaker() {
            log::warn!("Could not route output to the loudspeaker, using default route: {}", e);
        }

        let format = StreamFormat {
            sample_rate: source.sample_rate(),
            channels: source.channels(),
        };
        let rendered = Arc::new(AtomicU64::new(0));
        let mut renderer = Renderer::new(source, chain, Arc::clone(&rendered));

        self.device
            .start(format, Box::new(move |out: &mut [f32]| renderer.render(out)))
            .map_err(|e| {
                log::error!("Failed to start output device: {}", e);
                EngineError::from(e)
            })?;

        log::info!(
            "Rendering {} nodes at {} Hz, {} channel(s)",
            node_count,
            format.sample_rate,
            format.channels
        );
        self.session = Some(ActiveSession {
            rendered,
            node_count,
        });
        Ok(())
    }

    /// Halts rendering and drops the chain. Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                self.device.stop();
                log::debug!("Released {} render nodes", session.node_count);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some() && self.device.is_running()
    }

    /// Source frames consumed by the render thread in the current session.
    ///
    /// This is the position of the last block pulled into the chain, not of
    /// what has reached the device: it leads playback by up to one block plus
    /// whatever output is still queued.
    pub fn rendered_samples(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| s.rendered.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn active_node_count(&self) -> usize {
        self.session.as_ref().map(|s| s.node_count).unwrap_or(0)
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
