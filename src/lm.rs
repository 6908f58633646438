use std::collections::HashMap;
use std::fmt;

use crate::dict::WordId;
use crate::rules::TrgSym;
use crate::{Err, Score};

/// LM context carried on a chart node: the words still exposed on its left
/// edge (scored without full context so far, so a parent can correct them)
/// and the words a right neighbor may condition on.
///
/// Two states compare equal exactly when they are interchangeable for any
/// parent: same left edge to correct, same right edge to continue from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChartState {
  pub left: Vec<WordId>,
  pub right: Vec<WordId>,
}

/// What one language model contributes for one rule application: the log
/// probability of the newly scorable material, the number of
/// out-of-vocabulary words encountered, and the combined state of the new
/// node.
#[derive(Debug, Clone, PartialEq)]
pub struct NontermScore {
  pub log_prob: Score,
  pub oov: usize,
  pub state: ChartState,
}

/// Per-LM scoring seam. `target` is one factor's target sequence with slot
/// markers; `child_states[s]` is the state tuple of the node substituted at
/// slot s, from which the scorer reads its own entry `lm_id`.
pub trait LmScorer {
  fn nonterm_score(
    &self,
    target: &[TrgSym],
    child_states: &[Vec<ChartState>],
    lm_id: usize,
  ) -> Result<NontermScore, Err>;
}

/// A configured language model: the scorer plus its weights and the names
/// its contributions are recorded under in edge feature vectors.
pub struct LmModel {
  pub scorer: Box<dyn LmScorer>,
  pub weight: Score,
  pub oov_weight: Score,
  pub feature: String,
  pub oov_feature: String,
  /// Which target factor this model scores
  pub factor: usize,
}

impl LmModel {
  pub fn new(scorer: Box<dyn LmScorer>, weight: Score) -> Self {
    Self {
      scorer,
      weight,
      oov_weight: 0.0,
      feature: "lm".to_string(),
      oov_feature: "lmunk".to_string(),
      factor: 0,
    }
  }
}

impl fmt::Debug for LmModel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LmModel")
      .field("weight", &self.weight)
      .field("oov_weight", &self.oov_weight)
      .field("feature", &self.feature)
      .field("oov_feature", &self.oov_feature)
      .field("factor", &self.factor)
      .finish_non_exhaustive()
  }
}

/// Plain bigram model over interned word ids with unigram fallback.
///
/// A node's leftmost word is scored as a unigram when first built; when a
/// parent later places known context before it, the parent adds the
/// difference between the contextual and context-free scores. Unknown words
/// score at a fixed floor and count as OOVs.
#[derive(Debug, Clone)]
pub struct BigramLm {
  unigrams: HashMap<WordId, Score>,
  bigrams: HashMap<(WordId, WordId), Score>,
  oov_log_prob: Score,
}

impl BigramLm {
  pub fn new(oov_log_prob: Score) -> Self {
    Self {
      unigrams: HashMap::new(),
      bigrams: HashMap::new(),
      oov_log_prob,
    }
  }

  pub fn add_unigram(&mut self, word: WordId, log_prob: Score) {
    self.unigrams.insert(word, log_prob);
  }

  pub fn add_bigram(&mut self, prev: WordId, word: WordId, log_prob: Score) {
    self.bigrams.insert((prev, word), log_prob);
  }

  /// Score of `word` after `prev`; true when it's an OOV
  fn score_word(&self, prev: Option<WordId>, word: WordId) -> (Score, bool) {
    match self.unigrams.get(&word) {
      None => (self.oov_log_prob, true),
      Some(&uni) => {
        let lp = prev
          .and_then(|p| self.bigrams.get(&(p, word)).copied())
          .unwrap_or(uni);
        (lp, false)
      }
    }
  }
}

impl LmScorer for BigramLm {
  fn nonterm_score(
    &self,
    target: &[TrgSym],
    child_states: &[Vec<ChartState>],
    lm_id: usize,
  ) -> Result<NontermScore, Err> {
    let mut log_prob = 0.0;
    let mut oov = 0;
    // the word immediately before the current position, if any
    let mut prev: Option<WordId> = None;
    let mut left: Vec<WordId> = Vec::new();
    let mut seen_any = false;

    for sym in target {
      match *sym {
        TrgSym::Word(w) => {
          let (lp, is_oov) = self.score_word(prev, w);
          log_prob += lp;
          if is_oov {
            oov += 1;
          }
          if !seen_any {
            left = vec![w];
            seen_any = true;
          }
          prev = Some(w);
        }
        TrgSym::Slot(s) => {
          let state = child_states
            .get(s)
            .and_then(|tuple| tuple.get(lm_id))
            .ok_or_else(|| -> Err { format!("no LM state for slot {}", s).into() })?;
          if let (Some(p), Some(&first)) = (prev, state.left.first()) {
            // the child charged a context-free score for its left edge;
            // rescore it now that its context is known
            if self.unigrams.contains_key(&first) {
              log_prob += self.score_word(Some(p), first).0 - self.unigrams[&first];
            }
          }
          if !seen_any && !state.left.is_empty() {
            left = state.left.clone();
            seen_any = true;
          }
          if let Some(&last) = state.right.last() {
            prev = Some(last);
            seen_any = true;
          }
        }
      }
    }

    let right = match prev {
      Some(p) => vec![p],
      None => Vec::new(),
    };
    Ok(NontermScore {
      log_prob,
      oov,
      state: ChartState { left, right },
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dict::Dict;

  fn lm(dict: &mut Dict) -> BigramLm {
    let mut lm = BigramLm::new(-100.0);
    for (w, lp) in [("the", -1.0), ("dog", -2.0), ("ran", -3.0)] {
      lm.add_unigram(dict.intern(w), lp);
    }
    lm.add_bigram(dict.intern("the"), dict.intern("dog"), -0.25);
    lm.add_bigram(dict.intern("dog"), dict.intern("ran"), -0.5);
    lm
  }

  fn words(dict: &mut Dict, s: &str) -> Vec<TrgSym> {
    s.split_whitespace()
      .map(|w| TrgSym::Word(dict.intern(w)))
      .collect()
  }

  #[test]
  fn test_lexical_scoring_chains_bigrams() {
    let mut dict = Dict::new();
    let lm = lm(&mut dict);
    let target = words(&mut dict, "the dog ran");
    let scores = lm.nonterm_score(&target, &[], 0).unwrap();
    // unigram for the first word, bigrams after
    assert_eq!(scores.log_prob, -1.0 + -0.25 + -0.5);
    assert_eq!(scores.oov, 0);
    assert_eq!(scores.state.left, vec![dict.intern("the")]);
    assert_eq!(scores.state.right, vec![dict.intern("ran")]);
  }

  #[test]
  fn test_oov_scores_at_floor() {
    let mut dict = Dict::new();
    let lm = lm(&mut dict);
    let target = words(&mut dict, "the zebra");
    let scores = lm.nonterm_score(&target, &[], 0).unwrap();
    assert_eq!(scores.log_prob, -1.0 + -100.0);
    assert_eq!(scores.oov, 1);
  }

  #[test]
  fn test_child_state_composition() {
    let mut dict = Dict::new();
    let lm = lm(&mut dict);
    let the = dict.intern("the");
    let dog = dict.intern("dog");
    let ran = dict.intern("ran");

    // child already scored "dog" context-free; parent is "the x0 ran"
    let child = vec![ChartState {
      left: vec![dog],
      right: vec![dog],
    }];
    let target = vec![TrgSym::Word(the), TrgSym::Slot(0), TrgSym::Word(ran)];
    let scores = lm.nonterm_score(&target, &[child], 0).unwrap();
    // uni(the) + [bigram(the, dog) - uni(dog)] + bigram(dog, ran)
    assert_eq!(scores.log_prob, -1.0 + (-0.25 - -2.0) + -0.5);
    assert_eq!(scores.state.left, vec![the]);
    assert_eq!(scores.state.right, vec![ran]);
  }

  #[test]
  fn test_empty_child_is_transparent() {
    let mut dict = Dict::new();
    let lm = lm(&mut dict);
    let the = dict.intern("the");
    let dog = dict.intern("dog");
    let child = vec![ChartState::default()];
    let target = vec![TrgSym::Word(the), TrgSym::Slot(0), TrgSym::Word(dog)];
    let scores = lm.nonterm_score(&target, &[child], 0).unwrap();
    // the empty child doesn't break the bigram chain
    assert_eq!(scores.log_prob, -1.0 + -0.25);
    assert_eq!(scores.state.right, vec![dog]);
  }

  #[test]
  fn test_empty_target_has_empty_state() {
    let mut dict = Dict::new();
    let lm = lm(&mut dict);
    let scores = lm.nonterm_score(&[], &[], 0).unwrap();
    assert_eq!(scores.log_prob, 0.0);
    assert_eq!(scores.state, ChartState::default());
  }

  #[test]
  fn test_missing_child_state_is_an_error() {
    let mut dict = Dict::new();
    let lm = lm(&mut dict);
    assert!(lm.nonterm_score(&[TrgSym::Slot(0)], &[], 0).is_err());
  }
}
