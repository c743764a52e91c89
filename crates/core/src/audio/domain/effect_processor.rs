use super::effect_node::EffectKind;

/// Domain interface for one streaming stage of the render chain.
///
/// Implementations consume interleaved blocks and append their output, which
/// may be longer or shorter than the input when the stage changes the
/// playback rate. Processing runs on the audio render thread.
pub trait EffectProcessor: Send {
    fn kind(&self) -> EffectKind;

    fn process(&mut self, input: &[f32], output: &mut Vec<f32>);

    /// Emits any samples still buffered once the source is exhausted.
    fn flush(&mut self, _output: &mut Vec<f32>) {}
}
