use std::fs;
use std::rc::Rc;
use std::str::FromStr;

use crate::dict::{Dict, WordId};
use crate::features::FeatureVec;
use crate::labels::HeadLabels;
use crate::parse_rules::parse;
use crate::trie::RuleTrie;
use crate::Err;

/// One symbol of a rule's source pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SrcSym {
  /// A terminal source word
  Word(WordId),
  /// A nonterminal substitution slot; slots are numbered by order of
  /// appearance in the pattern
  Nonterm(HeadLabels),
}

impl SrcSym {
  pub fn is_nonterm(&self) -> bool {
    matches!(self, Self::Nonterm(_))
  }
}

/// One item of a target factor sequence: a concrete word or a reference to
/// the rule's k-th source nonterminal slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrgSym {
  Word(WordId),
  Slot(usize),
}

/// Target sequences, one per factor
pub type TrgData = Vec<Vec<TrgSym>>;

/// A Hiero-style synchronous rule: a source pattern of terminals and labeled
/// slots, per-factor target sequences, a sparse feature vector, and the head
/// label the rule builds. Immutable after load; shared via `Rc`.
#[derive(Debug, PartialEq)]
pub struct TranslationRule {
  pub head: HeadLabels,
  pub src: Vec<SrcSym>,
  pub trg: TrgData,
  pub features: FeatureVec,
}

impl TranslationRule {
  /// Number of nonterminal slots in the source pattern
  pub fn arity(&self) -> usize {
    self.src.iter().filter(|s| s.is_nonterm()).count()
  }
}

/// A loaded rule table: the trie over source patterns, the rule lists its
/// leaves point at, and the dictionary everything is interned through.
#[derive(Debug)]
pub struct RuleTable {
  pub trie: RuleTrie,
  lists: Vec<Vec<Rc<TranslationRule>>>,
  pub dict: Dict,
  pub trg_factors: usize,
}

impl RuleTable {
  pub fn new(trg_factors: usize) -> Self {
    assert!(trg_factors >= 1, "need at least one target factor");
    Self {
      trie: RuleTrie::new(),
      lists: Vec::new(),
      dict: Dict::new(),
      trg_factors,
    }
  }

  pub fn add_rule(&mut self, rule: TranslationRule) {
    assert_eq!(rule.trg.len(), self.trg_factors);
    let slot = self.trie.insert(&rule.src);
    let id = *slot.get_or_insert_with(|| {
      self.lists.push(Vec::new());
      self.lists.len() - 1
    });
    self.lists[id].push(Rc::new(rule));
  }

  /// The rules stored under a rule-list id returned by `RuleTrie::rule_list`
  pub fn rules(&self, list_id: usize) -> &[Rc<TranslationRule>] {
    &self.lists[list_id]
  }

  /// Every rule in the table
  pub fn iter_rules(&self) -> impl Iterator<Item = &Rc<TranslationRule>> {
    self.lists.iter().flatten()
  }

  /// Total number of rules in the table
  pub fn len(&self) -> usize {
    self.lists.iter().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.lists.is_empty()
  }

  pub fn read_from_file(filename: &str, trg_factors: usize) -> Result<Self, Err> {
    let src = fs::read_to_string(filename)
      .map_err(|e| -> Err { format!("couldn't read rule table {}: {}", filename, e).into() })?;
    parse(&src, trg_factors)
  }
}

impl FromStr for RuleTable {
  type Err = Err;

  /// Parses a single-factor rule table from text
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse(s, 1)
  }
}
