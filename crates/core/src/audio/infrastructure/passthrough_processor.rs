use crate::audio::domain::effect_node::EffectKind;
use crate::audio::domain::effect_processor::EffectProcessor;

/// Identity stage: copies its input unchanged.
pub struct PassthroughProcessor;

impl EffectProcessor for PassthroughProcessor {
    fn kind(&self) -> EffectKind {
        EffectKind::Passthrough
    }

    fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        output.extend_from_slice(input);
    }
}
