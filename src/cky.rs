//! CKY+ decoding without a dot chart (Sennrich, SSST 2014): partial rule
//! matches are cursors into the rule trie, extended one symbol at a time
//! across split points; completed matches per span are promoted into chart
//! hypotheses and forest edges by cube pruning.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::chart::ChartItem;
use crate::collection::Collection;
use crate::decoder::Decoder;
use crate::dict::WordId;
use crate::forest::{Hypergraph, NodeId};
use crate::labels::HeadLabels;
use crate::lm::ChartState;
use crate::path::CfgPath;
use crate::{Err, Score, INFEASIBLE};

/// Parses `sent` bottom-up and returns the translation forest.
///
/// Spans are walked with `i` from right to left, and for each `i`, `j`
/// outward from the diagonal, so every sub-span is finished before a wider
/// span reads it. A span's own nonterminals may start new rule matches (as
/// the first symbol of a wider match), so those paths are seeded right after
/// the span is pruned; completions they produce always land in wider spans
/// of the same row.
pub fn decode(dec: &Decoder, sent: &[WordId]) -> Result<Hypergraph, Err> {
  let n = sent.len();
  let mut chart: Vec<ChartItem> = (0..n * n).map(|_| ChartItem::new()).collect();
  let mut collections: Vec<Collection> = (0..n * n).map(|_| Collection::new()).collect();
  let mut forest = Hypergraph::new();

  for i in (0..n).rev() {
    // lexical base case: a path consuming the single terminal at (i, i)
    if let Some(path) = CfgPath::start(dec.trie()).with_terminal(dec.trie(), sent[i]) {
      add_to_chart(dec, &path, sent, n, i, i, false, &chart, &mut collections);
    }
    for j in i..n {
      cube_prune(dec, n, i, j, &collections, &mut chart, &mut forest)?;
      // paths whose first symbol substitutes (i, j) itself; they may not
      // complete on this span but can extend to the right
      for label in chart[i * n + j].labels() {
        if let Some(path) = CfgPath::start(dec.trie()).with_nonterminal(dec.trie(), label, (i, j)) {
          add_to_chart(dec, &path, sent, n, i, j, true, &chart, &mut collections);
        }
      }
    }
  }

  Ok(forest)
}

/// Extends a partial match covering `i..=j-1` by one symbol covering
/// `j..=k`: the terminal at `j` when `j == k`, or any nonterminal the chart
/// built over `(j, k)`.
fn consume(
  dec: &Decoder,
  path: &CfgPath,
  sent: &[WordId],
  n: usize,
  i: usize,
  j: usize,
  k: usize,
  chart: &[ChartItem],
  collections: &mut [Collection],
) {
  // an empty prefix would make the whole span one substituted nonterminal
  let unary = i == j;
  if j == k {
    if let Some(next) = path.with_terminal(dec.trie(), sent[j]) {
      add_to_chart(dec, &next, sent, n, i, k, unary, chart, collections);
    }
  }
  for label in chart[j * n + k].labels() {
    if let Some(next) = path.with_nonterminal(dec.trie(), label, (j, k)) {
      add_to_chart(dec, &next, sent, n, i, k, unary, chart, collections);
    }
  }
}

/// Records the rules completed by a match covering `i..=j` (unless the match
/// is a single span-filling nonterminal, which would recurse forever), then
/// tries every longer continuation to the right.
fn add_to_chart(
  dec: &Decoder,
  path: &CfgPath,
  sent: &[WordId],
  n: usize,
  i: usize,
  j: usize,
  unary: bool,
  chart: &[ChartItem],
  collections: &mut [Collection],
) {
  if !unary {
    if let Some(list) = dec.trie().rule_list(path.cursor) {
      trace!(i, j, rules = dec.table().rules(list).len(), "collected rules");
      collections[i * n + j].add_rules(path, dec.table().rules(list));
    }
  }
  if dec.trie().has_extensions(path.cursor) {
    for k in j + 1..n {
      consume(dec, path, sent, n, i, j + 1, k, chart, collections);
    }
  }
}

/// A cube-pruning hypothesis: the score of one (rule, child ranks)
/// combination. `ids[0]` is the rule's index in the span's collection,
/// `ids[1..]` the beam rank chosen for each child slot. Ties on score pop
/// the lexicographically smallest id tuple first, keeping decodes
/// reproducible.
#[derive(Debug)]
struct QueueEntry {
  score: Score,
  ids: Vec<usize>,
}

impl Ord for QueueEntry {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .score
      .total_cmp(&other.score)
      .then_with(|| other.ids.cmp(&self.ids))
  }
}

impl PartialOrd for QueueEntry {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for QueueEntry {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for QueueEntry {}

/// Promotes the rules collected for `(i, j)` into chart hypotheses and
/// forest edges, best-first, popping at most the configured limit.
fn cube_prune(
  dec: &Decoder,
  n: usize,
  i: usize,
  j: usize,
  collections: &[Collection],
  chart: &mut [ChartItem],
  forest: &mut Hypergraph,
) -> Result<(), Err> {
  let id = i * n + j;
  assert!(!chart[id].is_populated(), "span pruned twice");
  let coll = &collections[id];
  debug!(i, j, rules = coll.len(), "cube pruning span");

  let mut queue: BinaryHeap<QueueEntry> = BinaryHeap::new();
  let mut queued: HashSet<Vec<usize>> = HashSet::new();

  // seed each rule with every child at its best rank
  for k in 0..coll.len() {
    let rule = coll.rule(k);
    let spans = coll.spans(k);
    let labels = coll.labels(k);
    let mut score = dec.weights().dot(&rule.features);
    for (s, &(ci, cj)) in spans.iter().enumerate() {
      score += chart[ci * n + cj].hyp_score(&labels[s], 0, forest);
      if score == INFEASIBLE {
        break;
      }
    }
    if score != INFEASIBLE {
      let mut ids = vec![0; spans.len() + 1];
      ids[0] = k;
      queued.insert(ids.clone());
      queue.push(QueueEntry { score, ids });
    }
  }

  // hypotheses the language models can't tell apart merge into one node
  let mut recomb: HashMap<(HeadLabels, Vec<ChartState>), NodeId> = HashMap::new();

  let mut num_popped = 0;
  while dec.pop_limit().map_or(true, |lim| num_popped < lim) {
    let Some(QueueEntry {
      score: top_score,
      ids,
    }) = queue.pop()
    else {
      break;
    };
    num_popped += 1;

    let rule = coll.rule(ids[0]);
    let spans = coll.spans(ids[0]);
    let labels = coll.labels(ids[0]);

    // assemble the edge: tails and the child states feeding the LMs
    let mut features = rule.features.clone();
    let mut tails = Vec::with_capacity(spans.len());
    let mut child_states: Vec<Vec<ChartState>> = Vec::with_capacity(spans.len());
    for (s, &(ci, cj)) in spans.iter().enumerate() {
      let sn = chart[ci * n + cj].stateful_node(&labels[s], ids[s + 1]);
      tails.push(sn.node);
      child_states.push(sn.state.clone());
    }

    // language-model integration
    let mut state = Vec::with_capacity(dec.lms().len());
    let mut lm_total = 0.0;
    for (lm_id, lm) in dec.lms().iter().enumerate() {
      let scores = lm
        .scorer
        .nonterm_score(&rule.trg[lm.factor], &child_states, lm_id)?;
      lm_total += scores.log_prob * lm.weight + scores.oov as Score * lm.oov_weight;
      if scores.log_prob != 0.0 {
        features.add(&lm.feature, scores.log_prob);
      }
      if scores.oov != 0 {
        features.add(&lm.oov_feature, scores.oov as Score);
      }
      state.push(scores.state);
    }
    let full_score = top_score + lm_total;

    // recombine with an equivalent hypothesis, or open a new node
    let key = (rule.head.clone(), state.clone());
    let head = match recomb.get(&key) {
      Some(&node) => {
        let existing = forest.node_mut(node);
        if full_score > existing.viterbi {
          existing.viterbi = full_score;
        }
        node
      }
      None => {
        let node = forest.add_node(rule.head.clone(), (i, j), full_score);
        chart[id].add_stateful_node(rule.head.clone(), node, state);
        recomb.insert(key, node);
        node
      }
    };
    forest.add_edge(head, features, rule.clone(), tails);

    // neighbors: bump each child one rank down its beam
    for (s, &(ci, cj)) in spans.iter().enumerate() {
      let rank = ids[s + 1];
      let delta = chart[ci * n + cj].hyp_score_diff(&labels[s], rank + 1, rank, forest);
      if delta == INFEASIBLE {
        continue;
      }
      let mut next = ids.clone();
      next[s + 1] += 1;
      if queued.insert(next.clone()) {
        queue.push(QueueEntry {
          score: top_score + delta,
          ids: next,
        });
      }
    }
  }

  chart[id].finalize(forest);
  Ok(())
}
