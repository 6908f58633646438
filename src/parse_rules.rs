/// Line-oriented parsing of rule-table text.
///
/// One rule per line, fields separated by `|||`:
///
/// ```text
/// head ||| source ||| target [||| target ...] ||| features
/// ```
///
/// with one target field per factor. Source nonterminal slots are written
/// `x0:LABEL`, `x1:LABEL`, ... in order of appearance; target fields refer
/// back to them as `x0`, `x1`. Multi-factor labels join their components
/// with `|` (a bare label replicates across factors). Features are
/// `name=value` pairs. `//` comments and blank lines are skipped.
use regex::Regex;

use crate::dict::{Dict, WordId};
use crate::features::FeatureVec;
use crate::labels::HeadLabels;
use crate::rules::{RuleTable, SrcSym, TranslationRule, TrgSym};
use crate::Err;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Parses rule-table text into a table with `trg_factors` target factors
pub fn parse(s: &str, trg_factors: usize) -> Result<RuleTable, Err> {
  let mut table = RuleTable::new(trg_factors);
  for (lineno, line) in s.lines().enumerate() {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
      continue;
    }
    let rule = parse_rule(line, trg_factors, &mut table.dict)
      .map_err(|e| -> Err { format!("rule table line {}: {}", lineno + 1, e).into() })?;
    table.add_rule(rule);
  }
  Ok(table)
}

fn parse_rule(line: &str, trg_factors: usize, dict: &mut Dict) -> Result<TranslationRule, Err> {
  let fields: Vec<&str> = line.split("|||").map(str::trim).collect();
  if fields.len() != trg_factors + 3 {
    return Err(
      format!(
        "expected {} fields (head, source, {} target(s), features), got {}",
        trg_factors + 3,
        trg_factors,
        fields.len()
      )
      .into(),
    );
  }

  let head = parse_labels(fields[0], trg_factors, dict)?;
  let (src, arity) = parse_src(fields[1], trg_factors, dict)?;
  let trg = fields[2..2 + trg_factors]
    .iter()
    .map(|f| parse_trg(f, arity, dict))
    .collect::<Result<_, Err>>()?;
  let features = parse_features(fields[trg_factors + 2])?;

  Ok(TranslationRule {
    head,
    src,
    trg,
    features,
  })
}

/// `A|B|...` with trg_factors + 1 components, or a bare label replicated
fn parse_labels(s: &str, trg_factors: usize, dict: &mut Dict) -> Result<HeadLabels, Err> {
  let ids: Vec<WordId> = s.split('|').map(|part| dict.intern(part)).collect();
  if ids.len() == trg_factors + 1 {
    Ok(HeadLabels::new(ids))
  } else if ids.len() == 1 {
    Ok(HeadLabels::new(vec![ids[0]; trg_factors + 1]))
  } else {
    Err(format!("label {} needs 1 or {} components", s, trg_factors + 1).into())
  }
}

fn parse_src(s: &str, trg_factors: usize, dict: &mut Dict) -> Result<(Vec<SrcSym>, usize), Err> {
  regex_static!(SLOT, r"^x(\d+):(.+)$");

  let mut syms = Vec::new();
  let mut arity = 0;
  for tok in s.split_whitespace() {
    if let Some(caps) = SLOT.captures(tok) {
      let idx: usize = caps[1].parse()?;
      if idx != arity {
        return Err(format!("source slots must appear in order; expected x{}, got x{}", arity, idx).into());
      }
      arity += 1;
      syms.push(SrcSym::Nonterm(parse_labels(&caps[2], trg_factors, dict)?));
    } else {
      syms.push(SrcSym::Word(dict.intern(tok)));
    }
  }
  if syms.is_empty() {
    return Err("empty source pattern".into());
  }
  Ok((syms, arity))
}

fn parse_trg(s: &str, arity: usize, dict: &mut Dict) -> Result<Vec<TrgSym>, Err> {
  regex_static!(SLOT_REF, r"^x(\d+)$");

  let mut syms = Vec::new();
  for tok in s.split_whitespace() {
    if let Some(caps) = SLOT_REF.captures(tok) {
      let idx: usize = caps[1].parse()?;
      if idx >= arity {
        return Err(format!("target refers to x{} but the source has {} slot(s)", idx, arity).into());
      }
      syms.push(TrgSym::Slot(idx));
    } else {
      syms.push(TrgSym::Word(dict.intern(tok)));
    }
  }
  Ok(syms)
}

fn parse_features(s: &str) -> Result<FeatureVec, Err> {
  let mut features = FeatureVec::new();
  for tok in s.split_whitespace() {
    let (name, value) = tok
      .split_once('=')
      .ok_or_else(|| -> Err { format!("feature {} isn't name=value", tok).into() })?;
    let value: f64 = value
      .parse()
      .map_err(|e| -> Err { format!("feature {}: {}", tok, e).into() })?;
    features.add(name, value);
  }
  Ok(features)
}
