use super::effect_node::{EffectKind, EffectNode};

/// One position in the render chain, from the source-adjacent node to the
/// output sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Effect(EffectKind),
    Sink,
}

/// Ordered chain of effect nodes terminated by the output sink.
///
/// Always holds at least one node. The chain is linear: each adjacent pair is
/// connected exactly once and the last node feeds the sink.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderGraph {
    nodes: Vec<EffectNode>,
}

impl RenderGraph {
    pub fn starting_with(node: EffectNode) -> Self {
        Self { nodes: vec![node] }
    }

    pub fn then(mut self, node: EffectNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn nodes(&self) -> &[EffectNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kinds(&self) -> Vec<EffectKind> {
        self.nodes.iter().map(EffectNode::kind).collect()
    }

    /// Node kinds followed by the sink.
    pub fn stages(&self) -> Vec<Stage> {
        self.nodes
            .iter()
            .map(|n| Stage::Effect(n.kind()))
            .chain(std::iter::once(Stage::Sink))
            .collect()
    }

    /// Every edge of the chain in order, ending with the edge into the sink.
    pub fn connections(&self) -> Vec<(Stage, Stage)> {
        self.stages().windows(2).map(|w| (w[0], w[1])).collect()
    }
}
