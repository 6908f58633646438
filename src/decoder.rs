use crate::cky;
use crate::dict::{Dict, WordId};
use crate::features::FeatureVec;
use crate::forest::Hypergraph;
use crate::labels::HeadLabels;
use crate::lm::LmModel;
use crate::rules::RuleTable;
use crate::trie::RuleTrie;
use crate::Err;

/// Everything a decode reads: one rule table, any number of language
/// models, the feature weights, and the cube-pruning pop limit. Immutable
/// while decoding; each call to `decode` builds its own chart and forest.
#[derive(Debug)]
pub struct Decoder {
  table: RuleTable,
  lms: Vec<LmModel>,
  weights: FeatureVec,
  pop_limit: Option<usize>,
  root_label: HeadLabels,
  unk_label: HeadLabels,
  empty_label: HeadLabels,
}

impl Decoder {
  pub fn new(mut table: RuleTable) -> Self {
    let factors = table.trg_factors;
    let root_label = HeadLabels::root(&mut table.dict, factors);
    let unk_label = HeadLabels::unk(&mut table.dict, factors);
    let empty_label = HeadLabels::empty(&mut table.dict, factors);
    Self {
      table,
      lms: Vec::new(),
      weights: FeatureVec::new(),
      pop_limit: None,
      root_label,
      unk_label,
      empty_label,
    }
  }

  /// Builds a decoder from rule-table files. Exactly one table is
  /// supported.
  pub fn from_rule_files(filenames: &[&str], trg_factors: usize) -> Result<Self, Err> {
    let [filename] = filenames else {
      return Err(format!("expected exactly one rule table, got {}", filenames.len()).into());
    };
    Ok(Self::new(RuleTable::read_from_file(filename, trg_factors)?))
  }

  pub fn set_weights(&mut self, weights: FeatureVec) {
    self.weights = weights;
  }

  /// `None` leaves cube pruning unbounded
  pub fn set_pop_limit(&mut self, pop_limit: Option<usize>) {
    self.pop_limit = pop_limit;
  }

  pub fn add_lm(&mut self, lm: LmModel) -> Result<(), Err> {
    if lm.factor >= self.table.trg_factors {
      return Err(
        format!(
          "lm reads factor {} but the table has {}",
          lm.factor, self.table.trg_factors
        )
        .into(),
      );
    }
    self.lms.push(lm);
    Ok(())
  }

  pub fn table(&self) -> &RuleTable {
    &self.table
  }

  pub fn trie(&self) -> &RuleTrie {
    &self.table.trie
  }

  pub fn dict(&self) -> &Dict {
    &self.table.dict
  }

  pub fn weights(&self) -> &FeatureVec {
    &self.weights
  }

  pub fn lms(&self) -> &[LmModel] {
    &self.lms
  }

  pub fn pop_limit(&self) -> Option<usize> {
    self.pop_limit
  }

  pub fn root_label(&self) -> &HeadLabels {
    &self.root_label
  }

  pub fn unk_label(&self) -> &HeadLabels {
    &self.unk_label
  }

  pub fn empty_label(&self) -> &HeadLabels {
    &self.empty_label
  }

  /// Interns a whitespace-separated sentence through the table's dict.
  /// Words the table has never seen get an id outside the dictionary, which
  /// matches no rule.
  pub fn sentence_ids(&self, sentence: &str) -> Vec<WordId> {
    sentence
      .split_whitespace()
      .map(|w| self.table.dict.lookup(w).unwrap_or(WordId::MAX))
      .collect()
  }

  /// Parses one sentence into a translation forest
  pub fn decode(&self, sent: &[WordId]) -> Result<Hypergraph, Err> {
    cky::decode(self, sent)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exactly_one_rule_table() {
    assert!(Decoder::from_rule_files(&[], 1).is_err());
    assert!(Decoder::from_rule_files(&["a.rules", "b.rules"], 1).is_err());
    // one file, but missing on disk
    assert!(Decoder::from_rule_files(&["no-such-rule-table.rules"], 1).is_err());
  }

  #[test]
  fn test_distinguished_labels_share_the_table_dict() {
    let table: RuleTable = "S ||| w ||| W ||| p=-1".parse().unwrap();
    let dec = Decoder::new(table);
    let s = dec.dict().lookup("S").unwrap();
    assert_eq!(*dec.root_label(), HeadLabels::new(vec![s; 2]));
    assert_ne!(dec.root_label(), dec.unk_label());
    assert_ne!(dec.unk_label(), dec.empty_label());
  }

  #[test]
  fn test_lm_factor_is_validated() {
    use crate::lm::{ChartState, LmScorer, NontermScore};
    use crate::rules::TrgSym;

    struct StubLm;
    impl LmScorer for StubLm {
      fn nonterm_score(
        &self,
        _target: &[TrgSym],
        _child_states: &[Vec<ChartState>],
        _lm_id: usize,
      ) -> Result<NontermScore, Err> {
        Ok(NontermScore {
          log_prob: 0.0,
          oov: 0,
          state: ChartState::default(),
        })
      }
    }

    let table: RuleTable = "S ||| w ||| W ||| p=-1".parse().unwrap();
    let mut dec = Decoder::new(table);
    let mut lm = LmModel::new(Box::new(StubLm), 1.0);
    lm.factor = 1;
    assert!(dec.add_lm(lm).is_err());
  }

  #[test]
  fn test_unknown_words_match_nothing() {
    let table: RuleTable = "S ||| w ||| W ||| p=-1".parse().unwrap();
    let dec = Decoder::new(table);
    let ids = dec.sentence_ids("w unseen");
    assert_eq!(ids[1], WordId::MAX);
    let forest = dec.decode(&ids).unwrap();
    assert!(forest.node_for((0, 1), dec.root_label()).is_none());
  }
}
