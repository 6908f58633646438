use std::collections::BTreeMap;
use std::fmt;

use crate::Score;

/// Sparse feature vector keyed by feature name. Doubles as the weight
/// vector: scoring a rule is `weights.dot(&rule.features)`.
///
/// Backed by an ordered map so that iteration (and therefore float
/// accumulation order and display) is identical across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVec(BTreeMap<String, Score>);

impl FeatureVec {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn from_pairs<I, S>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (S, Score)>,
    S: Into<String>,
  {
    let mut v = Self::new();
    for (name, value) in pairs {
      v.add(&name.into(), value);
    }
    v
  }

  /// Value for `name`, zero when absent
  pub fn get(&self, name: &str) -> Score {
    self.0.get(name).copied().unwrap_or(0.0)
  }

  /// Adds `value` onto the entry for `name`
  pub fn add(&mut self, name: &str, value: Score) {
    *self.0.entry(name.to_string()).or_insert(0.0) += value;
  }

  /// Inner product; only names present in both vectors contribute
  pub fn dot(&self, other: &FeatureVec) -> Score {
    let (small, large) = if self.0.len() <= other.0.len() {
      (&self.0, &other.0)
    } else {
      (&other.0, &self.0)
    };
    small
      .iter()
      .filter_map(|(name, value)| large.get(name).map(|w| value * w))
      .sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, Score)> {
    self.0.iter().map(|(name, value)| (name.as_str(), *value))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for FeatureVec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (k, (name, value)) in self.0.iter().enumerate() {
      if k > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}={}", name, value)?;
    }
    Ok(())
  }
}

#[test]
fn test_dot_overlapping_names() {
  let weights = FeatureVec::from_pairs([("p", 0.5), ("count", 2.0)]);
  let features = FeatureVec::from_pairs([("p", -3.0), ("other", 10.0)]);
  assert_eq!(weights.dot(&features), -1.5);
  assert_eq!(features.dot(&weights), -1.5);
}

#[test]
fn test_add_accumulates() {
  let mut v = FeatureVec::new();
  v.add("lm", -1.0);
  v.add("lm", -0.5);
  assert_eq!(v.get("lm"), -1.5);
  assert_eq!(v.get("absent"), 0.0);
}

#[test]
fn test_display_is_name_ordered() {
  let mut v = FeatureVec::from_pairs([("b", 2.0), ("a", 1.0)]);
  v.add("c", 3.0);
  v.add("b", 1.0);
  assert_eq!(format!("{}", v), "a=1 b=3 c=3");
}
