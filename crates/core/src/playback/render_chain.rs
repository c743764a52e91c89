use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::domain::audio_source::AudioSource;
use crate::audio::domain::effect_processor::EffectProcessor;

/// Source frames pulled through the chain per step.
const BLOCK_FRAMES: usize = 512;

/// The instantiated stages of one render graph, run in order.
///
/// Intermediate blocks live in two buffers reused between calls.
pub struct RenderChain {
    processors: Vec<Box<dyn EffectProcessor>>,
    current: Vec<f32>,
    next: Vec<f32>,
}

impl RenderChain {
    pub fn new(processors: Vec<Box<dyn EffectProcessor>>) -> Self {
        Self {
            processors,
            current: Vec::new(),
            next: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Runs `input` through every stage and appends the result to `output`.
    pub fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        self.run(input, false, output);
    }

    /// Drains buffered tails. Each stage's tail is fed through the stages
    /// after it before those are flushed in turn.
    pub fn flush(&mut self, output: &mut Vec<f32>) {
        self.run(&[], true, output);
    }

    fn run(&mut self, input: &[f32], flush: bool, output: &mut Vec<f32>) {
        self.current.clear();
        self.current.extend_from_slice(input);
        for processor in &mut self.processors {
            self.next.clear();
            processor.process(&self.current, &mut self.next);
            if flush {
                processor.flush(&mut self.next);
            }
            std::mem::swap(&mut self.current, &mut self.next);
        }
        output.extend_from_slice(&self.current);
    }
}

/// Pulls source frames through a render chain on demand.
///
/// Lives inside the device callback. The number of source frames consumed is
/// published through a shared counter so the controller can read the render
/// position without touching the audio thread. The counter moves a whole
/// block at a time when the block enters the chain, so it can run up to one
/// block plus the queued output ahead of what the device has played.
pub struct Renderer {
    source: Arc<AudioSource>,
    chain: RenderChain,
    cursor: u64,
    pending: VecDeque<f32>,
    scratch: Vec<f32>,
    rendered: Arc<AtomicU64>,
    drained: bool,
}

impl Renderer {
    pub fn new(source: Arc<AudioSource>, chain: RenderChain, rendered: Arc<AtomicU64>) -> Self {
        Self {
            source,
            chain,
            cursor: 0,
            pending: VecDeque::new(),
            scratch: Vec::new(),
            rendered,
            drained: false,
        }
    }

    /// Fills `out` with rendered samples, then silence once the source and
    /// every stage tail are exhausted.
    pub fn render(&mut self, out: &mut [f32]) {
        let channels = self.source.channels() as usize;
        while self.pending.len() < out.len() && !self.drained {
            self.scratch.clear();
            let block = self.source.read_frames(self.cursor, BLOCK_FRAMES);
            if block.is_empty() {
                self.chain.flush(&mut self.scratch);
                self.drained = true;
            } else {
                self.chain.process(block, &mut self.scratch);
                self.cursor += (block.len() / channels) as u64;
                self.rendered.store(self.cursor, Ordering::Release);
            }
            self.pending.extend(self.scratch.drain(..));
        }

        for sample in out.iter_mut() {
            *sample = self.pending.pop_front().unwrap_or(0.0);
        }
    }

    pub fn is_drained(&self) -> bool {
        self.drained && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::effect_node::EffectKind;
    use crate::audio::infrastructure::passthrough_processor::PassthroughProcessor;

    /// Doubles every sample and emits `tail` on flush.
    struct Gain {
        tail: Vec<f32>,
    }

    impl EffectProcessor for Gain {
        fn kind(&self) -> EffectKind {
            EffectKind::Echo
        }

        fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
            output.extend(input.iter().map(|s| s * 2.0));
        }

        fn flush(&mut self, output: &mut Vec<f32>) {
            output.append(&mut self.tail);
        }
    }

    fn renderer(samples: Vec<f32>, chain: RenderChain) -> (Renderer, Arc<AtomicU64>) {
        let rendered = Arc::new(AtomicU64::new(0));
        let source = Arc::new(AudioSource::new(samples, 8000, 1));
        (Renderer::new(source, chain, Arc::clone(&rendered)), rendered)
    }

    #[test]
    fn test_chain_runs_stages_in_order() {
        let mut chain = RenderChain::new(vec![
            Box::new(Gain { tail: vec![] }),
            Box::new(Gain { tail: vec![] }),
        ]);
        let mut out = Vec::new();
        chain.process(&[1.0, -0.5], &mut out);
        assert_eq!(out, vec![4.0, -2.0]);
    }

    #[test]
    fn test_flush_feeds_tail_through_later_stages() {
        let mut chain = RenderChain::new(vec![
            Box::new(Gain { tail: vec![1.0] }),
            Box::new(Gain { tail: vec![0.25] }),
        ]);
        let mut out = Vec::new();
        chain.flush(&mut out);
        assert_eq!(out, vec![2.0, 0.25]);
    }

    #[test]
    fn test_chain_reuses_buffers_between_blocks() {
        let mut chain = RenderChain::new(vec![
            Box::new(Gain { tail: vec![] }),
            Box::new(Gain { tail: vec![] }),
        ]);
        let mut out = Vec::new();
        chain.process(&[0.5; 64], &mut out);
        let capacity = (chain.current.capacity(), chain.next.capacity());

        out.clear();
        chain.process(&[0.25; 64], &mut out);

        assert_eq!(out, vec![1.0; 64]);
        assert_eq!((chain.current.capacity(), chain.next.capacity()), capacity);
    }

    #[test]
    fn test_renderer_position_counts_consumed_blocks() {
        let chain = RenderChain::new(vec![Box::new(PassthroughProcessor)]);
        let (mut renderer, rendered) = renderer(vec![0.5; 2000], chain);

        let mut out = vec![0.0; 1];
        renderer.render(&mut out);

        assert_eq!(rendered.load(Ordering::Acquire), BLOCK_FRAMES as u64);
        assert_eq!(renderer.pending.len(), BLOCK_FRAMES - 1);
    }

    #[test]
    fn test_renderer_plays_source_then_silence() {
        let chain = RenderChain::new(vec![Box::new(PassthroughProcessor)]);
        let (mut renderer, rendered) = renderer(vec![0.1, 0.2, 0.3], chain);

        let mut out = vec![9.0; 5];
        renderer.render(&mut out);

        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.0, 0.0]);
        assert_eq!(rendered.load(Ordering::Acquire), 3);
        assert!(renderer.is_drained());
    }

    #[test]
    fn test_renderer_tracks_position_across_callbacks() {
        let chain = RenderChain::new(vec![Box::new(PassthroughProcessor)]);
        let (mut renderer, rendered) = renderer(vec![0.5; 2000], chain);

        let mut out = vec![0.0; 100];
        renderer.render(&mut out);
        assert_eq!(rendered.load(Ordering::Acquire), BLOCK_FRAMES as u64);
        assert!(!renderer.is_drained());

        let mut rest = vec![0.0; 1900];
        renderer.render(&mut rest);
        assert_eq!(rendered.load(Ordering::Acquire), 2000);
        assert!(rest.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn test_renderer_on_empty_source_outputs_silence() {
        let chain = RenderChain::new(vec![Box::new(PassthroughProcessor)]);
        let (mut renderer, rendered) = renderer(Vec::new(), chain);
        let mut out = vec![1.0; 4];
        renderer.render(&mut out);
        assert_eq!(out, vec![0.0; 4]);
        assert_eq!(rendered.load(Ordering::Acquire), 0);
    }
}
