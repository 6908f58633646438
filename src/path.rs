use crate::dict::WordId;
use crate::labels::HeadLabels;
use crate::rules::SrcSym;
use crate::trie::{RuleTrie, TrieCursor};

/// A source span, inclusive on both ends
pub type Span = (usize, usize);

/// A partial rule match: where the match sits in the rule trie, plus which
/// sub-spans and labels its nonterminals substitute so far, in slot order.
/// Extension copies the parent; paths for different split points never share
/// mutable state.
#[derive(Debug, Clone)]
pub struct CfgPath {
  pub cursor: TrieCursor,
  pub spans: Vec<Span>,
  pub labels: Vec<HeadLabels>,
}

impl CfgPath {
  /// The empty match at the trie root
  pub fn start(trie: &RuleTrie) -> Self {
    Self {
      cursor: trie.cursor(),
      spans: Vec::new(),
      labels: Vec::new(),
    }
  }

  /// Extends the match by one terminal. `None` when no rule continues this
  /// way.
  pub fn with_terminal(&self, trie: &RuleTrie, word: WordId) -> Option<CfgPath> {
    let cursor = trie.advance(self.cursor, &SrcSym::Word(word))?;
    Some(CfgPath {
      cursor,
      spans: self.spans.clone(),
      labels: self.labels.clone(),
    })
  }

  /// Extends the match by a nonterminal with `label` substituting `span`.
  /// `None` when no rule continues this way.
  pub fn with_nonterminal(&self, trie: &RuleTrie, label: &HeadLabels, span: Span) -> Option<CfgPath> {
    let cursor = trie.advance(self.cursor, &SrcSym::Nonterm(label.clone()))?;
    let mut spans = self.spans.clone();
    spans.push(span);
    let mut labels = self.labels.clone();
    labels.push(label.clone());
    Some(CfgPath {
      cursor,
      spans,
      labels,
    })
  }
}
