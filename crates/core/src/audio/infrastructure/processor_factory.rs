use crate::audio::domain::effect_node::EffectNode;
use crate::audio::domain::effect_processor::EffectProcessor;
use crate::audio::domain::render_graph::RenderGraph;

use super::echo_processor::EchoProcessor;
use super::passthrough_processor::PassthroughProcessor;
use super::rate_pitch_processor::RatePitchProcessor;
use super::reverb_processor::ReverbProcessor;

/// Creates the DSP stage for one graph node.
///
/// Nodes that would leave the signal untouched resolve to a passthrough so
/// a default-rate, default-pitch chain costs nothing at render time.
pub fn create_processor(
    node: &EffectNode,
    sample_rate: u32,
    channels: u16,
) -> Box<dyn EffectProcessor> {
    if node.is_identity() {
        log::debug!("Using passthrough for identity {} stage", node.kind());
        return Box::new(PassthroughProcessor);
    }
    match node {
        EffectNode::RatePitch { rate, pitch_cents } => {
            log::debug!("Using phase vocoder (rate={}, pitch={} cents)", rate, pitch_cents);
            Box::new(RatePitchProcessor::new(*rate, *pitch_cents, channels))
        }
        EffectNode::Echo(settings) => {
            log::debug!("Using multi-tap echo ({} taps)", settings.taps.len());
            Box::new(EchoProcessor::new(settings, sample_rate, channels))
        }
        EffectNode::Reverb(settings) => {
            log::debug!("Using Schroeder reverb (decay={}s)", settings.decay_seconds);
            Box::new(ReverbProcessor::new(settings, sample_rate, channels))
        }
        EffectNode::Passthrough => Box::new(PassthroughProcessor),
    }
}

/// Instantiates every node of `graph` in order.
pub fn instantiate(
    graph: &RenderGraph,
    sample_rate: u32,
    channels: u16,
) -> Vec<Box<dyn EffectProcessor>> {
    graph
        .nodes()
        .iter()
        .map(|node| create_processor(node, sample_rate, channels))
        .collect()
}
