use std::collections::BTreeMap;

use crate::forest::{Hypergraph, NodeId};
use crate::labels::HeadLabels;
use crate::lm::ChartState;
use crate::{Score, INFEASIBLE};

/// A chart entry: the hypergraph node (owned by the hypergraph, referenced
/// by id here) together with the LM context it carries, one state per
/// configured language model
#[derive(Debug, Clone, PartialEq)]
pub struct StatefulNode {
  pub node: NodeId,
  pub state: Vec<ChartState>,
}

/// One span's parse items: for each head label, the beam of stateful nodes
/// built for it. After `finalize` each beam is sorted best-first and its
/// positions are the ranks cube pruning addresses; the item is then frozen.
///
/// An ordered map keys the beams so that iteration order, and everything
/// downstream of it (collection order, tie-breaks), is identical across
/// runs.
#[derive(Debug, Default)]
pub struct ChartItem {
  nodes: BTreeMap<HeadLabels, Vec<StatefulNode>>,
  populated: bool,
}

impl ChartItem {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn is_populated(&self) -> bool {
    self.populated
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Labels with at least one node, in label order
  pub fn labels(&self) -> impl Iterator<Item = &HeadLabels> {
    self.nodes.keys()
  }

  pub fn add_stateful_node(&mut self, label: HeadLabels, node: NodeId, state: Vec<ChartState>) {
    assert!(!self.populated, "chart item is frozen");
    self
      .nodes
      .entry(label)
      .or_default()
      .push(StatefulNode { node, state });
  }

  /// Viterbi score of the rank-th best node under `label`; `-inf` past the
  /// end of the beam. Asking for a label this span never built is a bug in
  /// the caller.
  pub fn hyp_score(&self, label: &HeadLabels, rank: usize, forest: &Hypergraph) -> Score {
    assert!(self.populated, "chart item not yet populated");
    let beam = self
      .nodes
      .get(label)
      .unwrap_or_else(|| panic!("no chart entry for label {}", label));
    beam
      .get(rank)
      .map(|sn| forest.node(sn.node).viterbi)
      .unwrap_or(INFEASIBLE)
  }

  /// Score change when a child hypothesis moves from `old_rank` to
  /// `new_rank`; `-inf` when the new rank is off the beam
  pub fn hyp_score_diff(
    &self,
    label: &HeadLabels,
    new_rank: usize,
    old_rank: usize,
    forest: &Hypergraph,
  ) -> Score {
    let new = self.hyp_score(label, new_rank, forest);
    if new == INFEASIBLE {
      INFEASIBLE
    } else {
      new - self.hyp_score(label, old_rank, forest)
    }
  }

  pub fn stateful_node(&self, label: &HeadLabels, rank: usize) -> &StatefulNode {
    assert!(self.populated, "chart item not yet populated");
    let beam = self
      .nodes
      .get(label)
      .unwrap_or_else(|| panic!("no chart entry for label {}", label));
    beam
      .get(rank)
      .unwrap_or_else(|| panic!("rank {} off the beam for label {}", rank, label))
  }

  /// Sorts each beam best-first and freezes the item
  pub fn finalize(&mut self, forest: &Hypergraph) {
    assert!(!self.populated, "chart item finalized twice");
    for beam in self.nodes.values_mut() {
      if beam.len() > 1 {
        beam.sort_by(|a, b| {
          forest
            .node(b.node)
            .viterbi
            .total_cmp(&forest.node(a.node).viterbi)
        });
      }
    }
    self.populated = true;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dict::Dict;

  fn label(dict: &mut Dict, sym: &str) -> HeadLabels {
    HeadLabels::new(vec![dict.intern(sym); 2])
  }

  fn item_with_scores(forest: &mut Hypergraph, label: &HeadLabels, scores: &[Score]) -> ChartItem {
    let mut item = ChartItem::new();
    for &s in scores {
      let node = forest.add_node(label.clone(), (0, 0), s);
      item.add_stateful_node(label.clone(), node, Vec::new());
    }
    item.finalize(forest);
    item
  }

  #[test]
  fn test_finalize_sorts_beams_best_first() {
    let mut dict = Dict::new();
    let x = label(&mut dict, "X");
    let mut forest = Hypergraph::new();
    let item = item_with_scores(&mut forest, &x, &[-3.0, -1.0, -2.0]);

    assert_eq!(item.hyp_score(&x, 0, &forest), -1.0);
    assert_eq!(item.hyp_score(&x, 1, &forest), -2.0);
    assert_eq!(item.hyp_score(&x, 2, &forest), -3.0);
    // past the beam
    assert_eq!(item.hyp_score(&x, 3, &forest), INFEASIBLE);
  }

  #[test]
  fn test_hyp_score_diff() {
    let mut dict = Dict::new();
    let x = label(&mut dict, "X");
    let mut forest = Hypergraph::new();
    let item = item_with_scores(&mut forest, &x, &[-1.0, -2.5]);

    assert_eq!(item.hyp_score_diff(&x, 1, 0, &forest), -1.5);
    assert_eq!(item.hyp_score_diff(&x, 2, 1, &forest), INFEASIBLE);
  }

  #[test]
  #[should_panic(expected = "no chart entry")]
  fn test_absent_label_is_a_bug() {
    let mut dict = Dict::new();
    let x = label(&mut dict, "X");
    let y = label(&mut dict, "Y");
    let mut forest = Hypergraph::new();
    let item = item_with_scores(&mut forest, &x, &[-1.0]);
    item.hyp_score(&y, 0, &forest);
  }

  #[test]
  #[should_panic(expected = "frozen")]
  fn test_no_mutation_after_finalize() {
    let mut dict = Dict::new();
    let x = label(&mut dict, "X");
    let mut forest = Hypergraph::new();
    let mut item = item_with_scores(&mut forest, &x, &[-1.0]);
    let node = forest.add_node(x.clone(), (0, 0), 0.0);
    item.add_stateful_node(x, node, Vec::new());
  }

  #[test]
  #[should_panic(expected = "not yet populated")]
  fn test_read_before_finalize_is_a_bug() {
    let mut dict = Dict::new();
    let x = label(&mut dict, "X");
    let forest = Hypergraph::new();
    let item = ChartItem::new();
    item.hyp_score(&x, 0, &forest);
  }
}
