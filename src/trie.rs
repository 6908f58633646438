use std::collections::HashMap;

use crate::rules::SrcSym;

/// Cursor into the rule trie: an opaque node handle. A value type, so a
/// partial rule match can carry its position cheaply; advancing past a
/// missing edge yields `None` instead of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieCursor(usize);

#[derive(Debug, Default)]
struct TrieNode {
  children: HashMap<SrcSym, usize>,
  rules: Option<usize>,
}

/// Prefix trie over rule source patterns, the decoder's view of the grammar.
///
/// Nodes exist only along inserted keys, which gives the two queries the
/// parser needs for free: a successful `advance` means some complete key
/// extends the new prefix (predictive search), and `rule_list` answers
/// whether the prefix is itself a complete key.
#[derive(Debug)]
pub struct RuleTrie {
  nodes: Vec<TrieNode>,
}

impl RuleTrie {
  pub fn new() -> Self {
    Self {
      nodes: vec![TrieNode::default()],
    }
  }

  /// Cursor at the empty prefix
  pub fn cursor(&self) -> TrieCursor {
    TrieCursor(0)
  }

  /// Extends the cursor's prefix by one symbol. `None` means no inserted key
  /// starts with the extended prefix.
  pub fn advance(&self, cur: TrieCursor, sym: &SrcSym) -> Option<TrieCursor> {
    self.nodes[cur.0].children.get(sym).copied().map(TrieCursor)
  }

  /// Whether any key is strictly longer than the cursor's prefix; gates
  /// further rightward extension of a partial match
  pub fn has_extensions(&self, cur: TrieCursor) -> bool {
    !self.nodes[cur.0].children.is_empty()
  }

  /// Rule-list id when the cursor's prefix is itself a complete key
  pub fn rule_list(&self, cur: TrieCursor) -> Option<usize> {
    self.nodes[cur.0].rules
  }

  /// Walks `key` into the trie, creating nodes as needed, and returns the
  /// final node's rule-list slot for the caller to fill
  pub fn insert(&mut self, key: &[SrcSym]) -> &mut Option<usize> {
    let mut at = 0;
    for sym in key {
      at = match self.nodes[at].children.get(sym) {
        Some(&next) => next,
        None => {
          let next = self.nodes.len();
          self.nodes.push(TrieNode::default());
          self.nodes[at].children.insert(sym.clone(), next);
          next
        }
      };
    }
    &mut self.nodes[at].rules
  }
}

impl Default for RuleTrie {
  fn default() -> Self {
    Self::new()
  }
}
