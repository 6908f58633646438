#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod cky;
pub mod collection;
pub mod decoder;
pub mod dict;
pub mod features;
pub mod forest;
pub mod labels;
pub mod lm;
pub mod parse_rules;
pub mod path;
pub mod rules;
pub mod trie;

pub use crate::decoder::Decoder;
pub use crate::forest::Hypergraph;
pub use crate::rules::RuleTable;

/// Boxed static error type
pub type Err = Box<dyn std::error::Error + 'static>;

/// Log-space score
pub type Score = f64;

/// Marks a hypothesis that can never be part of a derivation; absorbing
/// under addition
pub const INFEASIBLE: Score = f64::NEG_INFINITY;

#[test]
fn test_decode_toy_sentence() {
  use crate::features::FeatureVec;

  let table: RuleTable = r#"
    X ||| der hund ||| the dog ||| p=-0.5
    X ||| schnell ||| quickly ||| p=-0.25
    S ||| x0:X lief x1:X ||| x0 ran x1 ||| p=-0.25
  "#
  .parse()
  .unwrap();

  let mut dec = Decoder::new(table);
  dec.set_weights(FeatureVec::from_pairs([("p", 1.0)]));

  let sent = dec.sentence_ids("der hund lief schnell");
  let forest = dec.decode(&sent).unwrap();

  let root = forest.node_for((0, 3), dec.root_label()).unwrap();
  assert_eq!(forest.node(root).viterbi, -1.0);

  let edge = forest.edge(forest.node(root).edges[0]);
  assert_eq!(edge.tails.len(), 2);
  assert_eq!(forest.node(edge.tails[0]).span, (0, 1));
  assert_eq!(forest.node(edge.tails[1]).span, (3, 3));
}
