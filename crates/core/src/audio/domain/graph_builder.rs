use super::effect_node::{EchoSettings, EffectNode, ReverbSettings};
use super::playback_options::PlaybackOptions;
use super::render_graph::RenderGraph;

/// Selects and orders the render chain for a requested effect combination.
///
/// The rate/pitch node always comes first so echo and reverb see the
/// time/pitch-corrected signal. It is present even at default settings, where
/// it renders as a pass-through.
pub struct GraphBuilder {
    echo: EchoSettings,
    reverb: ReverbSettings,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            echo: EchoSettings::multi_echo(),
            reverb: ReverbSettings::cathedral(),
        }
    }

    pub fn build(&self, options: &PlaybackOptions) -> RenderGraph {
        let mut graph = RenderGraph::starting_with(EffectNode::RatePitch {
            rate: options.effective_rate(),
            pitch_cents: options.effective_pitch_cents(),
        });
        if options.echo {
            graph = graph.then(EffectNode::Echo(self.echo.clone()));
        }
        if options.reverb {
            graph = graph.then(EffectNode::Reverb(self.reverb));
        }
        log::debug!("Built render graph: {:?}", graph.kinds());
        graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::effect_node::EffectKind;
    use crate::audio::domain::render_graph::Stage;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::neither(false, false, vec![EffectKind::RatePitch])]
    #[case::echo_only(true, false, vec![EffectKind::RatePitch, EffectKind::Echo])]
    #[case::reverb_only(false, true, vec![EffectKind::RatePitch, EffectKind::Reverb])]
    #[case::both(true, true, vec![EffectKind::RatePitch, EffectKind::Echo, EffectKind::Reverb])]
    fn test_chain_topology(#[case] echo: bool, #[case] reverb: bool, #[case] expected: Vec<EffectKind>) {
        let options = PlaybackOptions {
            echo,
            reverb,
            ..Default::default()
        };
        let graph = GraphBuilder::new().build(&options);

        assert_eq!(graph.kinds(), expected);
        let stages = graph.stages();
        assert_eq!(stages.first(), Some(&Stage::Effect(EffectKind::RatePitch)));
        assert_eq!(stages.last(), Some(&Stage::Sink));
    }

    #[test]
    fn test_rate_and_pitch_reach_first_node() {
        let options = PlaybackOptions::default()
            .with_rate(1.5)
            .with_pitch_cents(-1000.0)
            .with_echo();
        let graph = GraphBuilder::new().build(&options);
        match &graph.nodes()[0] {
            EffectNode::RatePitch { rate, pitch_cents } => {
                assert_relative_eq!(*rate, 1.5);
                assert_relative_eq!(*pitch_cents, -1000.0);
            }
            other => panic!("expected rate-pitch first, got {other:?}"),
        }
    }

    #[test]
    fn test_default_options_yield_identity_rate_pitch() {
        let graph = GraphBuilder::new().build(&PlaybackOptions::default());
        assert!(graph.nodes()[0].is_identity());
    }

    #[test]
    fn test_reverb_uses_half_wet_mix() {
        let graph = GraphBuilder::new().build(&PlaybackOptions::default().with_reverb());
        match &graph.nodes()[1] {
            EffectNode::Reverb(settings) => assert_relative_eq!(settings.wet_dry_mix, 50.0),
            other => panic!("expected reverb, got {other:?}"),
        }
    }

    #[test]
    fn test_echo_precedes_reverb() {
        let graph = GraphBuilder::new().build(&PlaybackOptions::default().with_reverb().with_echo());
        assert_eq!(graph.nodes()[1].kind(), EffectKind::Echo);
        assert_eq!(graph.nodes()[2].kind(), EffectKind::Reverb);
    }
}
