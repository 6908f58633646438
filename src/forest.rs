use std::fmt;
use std::rc::Rc;

use crate::features::FeatureVec;
use crate::labels::HeadLabels;
use crate::path::Span;
use crate::rules::TranslationRule;
use crate::Score;

/// Index of a node in the hypergraph arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Index of an edge in the hypergraph arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

/// One rule application: the rule's features plus any language-model
/// additions, the rule itself (carrying the target data), and the
/// substituted child nodes in slot order.
#[derive(Debug)]
pub struct HyperEdge {
  pub head: NodeId,
  pub features: FeatureVec,
  pub rule: Rc<TranslationRule>,
  pub tails: Vec<NodeId>,
}

/// A forest node: every derivation of `label` over `span` that survived
/// pruning and recombined here, with the best derivation's score
#[derive(Debug)]
pub struct HyperNode {
  pub label: HeadLabels,
  pub span: Span,
  pub viterbi: Score,
  pub edges: Vec<EdgeId>,
}

/// The translation forest a decode produces. Owns every node and edge;
/// everything else holds ids into it. Outlives the chart that built it.
#[derive(Debug, Default)]
pub struct Hypergraph {
  nodes: Vec<HyperNode>,
  edges: Vec<HyperEdge>,
}

impl Hypergraph {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn add_node(&mut self, label: HeadLabels, span: Span, viterbi: Score) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(HyperNode {
      label,
      span,
      viterbi,
      edges: Vec::new(),
    });
    id
  }

  pub fn add_edge(
    &mut self,
    head: NodeId,
    features: FeatureVec,
    rule: Rc<TranslationRule>,
    tails: Vec<NodeId>,
  ) -> EdgeId {
    let id = EdgeId(self.edges.len() as u32);
    self.edges.push(HyperEdge {
      head,
      features,
      rule,
      tails,
    });
    self.nodes[head.0 as usize].edges.push(id);
    id
  }

  pub fn node(&self, id: NodeId) -> &HyperNode {
    &self.nodes[id.0 as usize]
  }

  pub fn node_mut(&mut self, id: NodeId) -> &mut HyperNode {
    &mut self.nodes[id.0 as usize]
  }

  pub fn edge(&self, id: EdgeId) -> &HyperEdge {
    &self.edges[id.0 as usize]
  }

  pub fn num_nodes(&self) -> usize {
    self.nodes.len()
  }

  pub fn num_edges(&self) -> usize {
    self.edges.len()
  }

  pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &HyperNode)> {
    self
      .nodes
      .iter()
      .enumerate()
      .map(|(k, n)| (NodeId(k as u32), n))
  }

  pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &HyperEdge)> {
    self
      .edges
      .iter()
      .enumerate()
      .map(|(k, e)| (EdgeId(k as u32), e))
  }

  /// The node built for `label` over `span`, if any. The conventional root
  /// of a decode over n words is `node_for((0, n - 1), root_label)`.
  pub fn node_for(&self, span: Span, label: &HeadLabels) -> Option<NodeId> {
    self
      .nodes()
      .find(|(_, n)| n.span == span && n.label == *label)
      .map(|(id, _)| id)
  }

  /// The best-scoring node for `label` over `span`. Distinct LM states can
  /// leave several nodes for one label on a span, and creation order follows
  /// pre-LM queue scores, so the first node is not necessarily the best.
  pub fn best_node_for(&self, span: Span, label: &HeadLabels) -> Option<NodeId> {
    self
      .nodes()
      .filter(|(_, n)| n.span == span && n.label == *label)
      .max_by(|(_, a), (_, b)| a.viterbi.total_cmp(&b.viterbi))
      .map(|(id, _)| id)
  }
}

impl fmt::Display for Hypergraph {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (id, node) in self.nodes() {
      writeln!(
        f,
        "n{} {}..{} {} score {}",
        id.0, node.span.0, node.span.1, node.label, node.viterbi
      )?;
      for &eid in &node.edges {
        let edge = self.edge(eid);
        write!(f, "  e{} <-", eid.0)?;
        for tail in &edge.tails {
          write!(f, " n{}", tail.0)?;
        }
        writeln!(f, " ({})", edge.features)?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dict::Dict;
  use crate::rules::{SrcSym, TrgSym};

  #[test]
  fn test_arena_wiring() {
    let mut dict = Dict::new();
    let x = HeadLabels::new(vec![dict.intern("X"); 2]);
    let rule = Rc::new(TranslationRule {
      head: x.clone(),
      src: vec![SrcSym::Word(dict.intern("a"))],
      trg: vec![vec![TrgSym::Word(dict.intern("A"))]],
      features: FeatureVec::new(),
    });

    let mut hg = Hypergraph::new();
    let child = hg.add_node(x.clone(), (0, 0), -1.0);
    let head = hg.add_node(x.clone(), (0, 1), -2.0);
    let e = hg.add_edge(head, FeatureVec::new(), rule, vec![child]);

    assert_eq!(hg.num_nodes(), 2);
    assert_eq!(hg.num_edges(), 1);
    assert_eq!(hg.node(head).edges, vec![e]);
    assert_eq!(hg.edge(e).tails, vec![child]);
    assert_eq!(hg.node_for((0, 1), &x), Some(head));
    assert_eq!(hg.node_for((1, 1), &x), None);

    // a later, better node on the same span: node_for keeps creation order,
    // best_node_for follows the score
    let head2 = hg.add_node(x.clone(), (0, 1), -1.5);
    assert_eq!(hg.node_for((0, 1), &x), Some(head));
    assert_eq!(hg.best_node_for((0, 1), &x), Some(head2));
  }
}
