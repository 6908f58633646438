use std::rc::Rc;

use crate::labels::HeadLabels;
use crate::path::{CfgPath, Span};
use crate::rules::TranslationRule;

/// Completed rule matches for one span, waiting for cube pruning. Three
/// parallel arrays: entry k is `rules[k]` applied with its nonterminals
/// substituting `spans[k]`, labeled `labels[k]`. All rules recorded from one
/// path share its span and label lists.
///
/// Filled while matching; read-only once the span's cube pruning starts.
#[derive(Debug, Default)]
pub struct Collection {
  rules: Vec<Rc<TranslationRule>>,
  spans: Vec<Rc<Vec<Span>>>,
  labels: Vec<Rc<Vec<HeadLabels>>>,
}

impl Collection {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn add_rules(&mut self, path: &CfgPath, rules: &[Rc<TranslationRule>]) {
    let spans = Rc::new(path.spans.clone());
    let labels = Rc::new(path.labels.clone());
    for rule in rules {
      debug_assert_eq!(rule.arity(), spans.len());
      self.rules.push(rule.clone());
      self.spans.push(spans.clone());
      self.labels.push(labels.clone());
    }
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  pub fn rule(&self, k: usize) -> &Rc<TranslationRule> {
    &self.rules[k]
  }

  pub fn spans(&self, k: usize) -> &[Span] {
    &self.spans[k]
  }

  pub fn labels(&self, k: usize) -> &[HeadLabels] {
    &self.labels[k]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dict::Dict;
  use crate::features::FeatureVec;
  use crate::rules::{SrcSym, TrgSym};
  use crate::trie::RuleTrie;

  #[test]
  fn test_parallel_arrays() {
    let mut dict = Dict::new();
    let x = HeadLabels::new(vec![dict.intern("X"); 2]);
    let rule = Rc::new(TranslationRule {
      head: x.clone(),
      src: vec![SrcSym::Nonterm(x.clone()), SrcSym::Word(dict.intern("b"))],
      trg: vec![vec![TrgSym::Slot(0)]],
      features: FeatureVec::new(),
    });

    let mut trie = RuleTrie::new();
    *trie.insert(&rule.src) = Some(0);
    let path = CfgPath::start(&trie)
      .with_nonterminal(&trie, &x, (0, 0))
      .unwrap()
      .with_terminal(&trie, dict.lookup("b").unwrap())
      .unwrap();

    let mut coll = Collection::new();
    coll.add_rules(&path, &[rule.clone(), rule.clone()]);
    assert_eq!(coll.len(), 2);
    for k in 0..coll.len() {
      assert_eq!(coll.spans(k), &[(0, 0)]);
      assert_eq!(coll.labels(k), &[x.clone()]);
      assert_eq!(coll.spans(k).len(), coll.rule(k).arity());
    }
  }
}
