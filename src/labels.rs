use std::fmt;

use crate::dict::{Dict, WordId};

/// Identifies a nonterminal across every target factor at once: one word id
/// per factor plus one shared between them, so a label for `trg_factors`
/// factors has `trg_factors + 1` components. Equality, hash, and order are
/// componentwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadLabels(Vec<WordId>);

impl HeadLabels {
  pub fn new(ids: Vec<WordId>) -> Self {
    assert!(!ids.is_empty(), "a head label needs at least one component");
    Self(ids)
  }

  fn uniform(dict: &mut Dict, trg_factors: usize, sym: &str) -> Self {
    Self(vec![dict.intern(sym); trg_factors + 1])
  }

  /// The sentence symbol "S" in every factor; the conventional forest root
  pub fn root(dict: &mut Dict, trg_factors: usize) -> Self {
    Self::uniform(dict, trg_factors, "S")
  }

  /// The generic symbol "X" in every factor; used for unknown-word handling
  /// by consumers that build pass-through rules
  pub fn unk(dict: &mut Dict, trg_factors: usize) -> Self {
    Self::uniform(dict, trg_factors, "X")
  }

  /// The empty symbol in every factor
  pub fn empty(dict: &mut Dict, trg_factors: usize) -> Self {
    Self::uniform(dict, trg_factors, "")
  }
}

impl fmt::Display for HeadLabels {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[")?;
    for (k, id) in self.0.iter().enumerate() {
      if k > 0 {
        write!(f, "|")?;
      }
      write!(f, "{}", id)?;
    }
    write!(f, "]")
  }
}

#[test]
fn test_componentwise_equality() {
  let mut d = Dict::new();
  let x = HeadLabels::new(vec![d.intern("X"), d.intern("X")]);
  let y = HeadLabels::new(vec![d.intern("X"), d.intern("Y")]);
  assert_eq!(x, HeadLabels::new(vec![d.intern("X"), d.intern("X")]));
  assert_ne!(x, y);
}

#[test]
fn test_distinguished_labels() {
  let mut d = Dict::new();
  let root = HeadLabels::root(&mut d, 1);
  let unk = HeadLabels::unk(&mut d, 1);
  let empty = HeadLabels::empty(&mut d, 1);
  assert_ne!(root, unk);
  assert_ne!(unk, empty);
  // the same symbols intern to the same labels
  assert_eq!(root, HeadLabels::root(&mut d, 1));
}
