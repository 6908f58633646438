use std::env;
use std::io;
use std::io::Write;
use std::process;

use spanforge::decoder::Decoder;
use spanforge::features::FeatureVec;
use spanforge::Err;

fn usage(prog_name: &str) -> String {
  format!(
    r"
Usage: {} RULES [options]

Reads one source sentence per line from stdin and prints the score of its
best full parse. RULES is a rule table: one rule per line,
`head ||| source ||| target ||| features`, with source nonterminal slots
written x0:LABEL and referenced from the target as x0.

Options:
  -h, --help          Print this message
  -f, --forest        Print the full translation forest (defaults to not printing)
  -p, --pop-limit N   Cube-pruning pop limit per span (defaults to unbounded)
  -w, --weight NAME=V Feature weight (repeatable; defaults to every weight 1)",
    prog_name
  )
}

fn decode(dec: &Decoder, sentence: &str, print_forest: bool) -> Result<(), Err> {
  let sent = dec.sentence_ids(sentence);
  let forest = dec.decode(&sent)?;

  if print_forest {
    print!("{}", forest);
  }

  if sent.is_empty() {
    return Ok(());
  }
  match forest.best_node_for((0, sent.len() - 1), dec.root_label()) {
    Some(root) => println!("best root score: {}", forest.node(root).viterbi),
    None => println!("no full parse"),
  }

  Ok(())
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts: Vec<String> = env::args().collect();
  let prog_name = opts[0].clone();

  if opts.len() < 2 {
    println!("{}", usage(&prog_name));
    process::exit(1);
  }

  let mut opts = opts.into_iter().skip(1);
  let filename = opts.next().unwrap();

  let mut print_forest = false;
  let mut pop_limit = None;
  let mut weights = Vec::new();
  while let Some(o) = opts.next() {
    if o == "-h" || o == "--help" {
      println!("{}", usage(&prog_name));
      process::exit(0);
    } else if o == "-f" || o == "--forest" {
      print_forest = true;
    } else if o == "-p" || o == "--pop-limit" {
      let n = opts.next().ok_or("--pop-limit needs a value")?;
      pop_limit = Some(n.parse::<usize>()?);
    } else if o == "-w" || o == "--weight" {
      let w = opts.next().ok_or("--weight needs NAME=VALUE")?;
      let (name, value) = w.split_once('=').ok_or("--weight needs NAME=VALUE")?;
      weights.push((name.to_string(), value.parse::<f64>()?));
    } else {
      return Err(format!("unknown option {}", o).into());
    }
  }

  let mut dec = Decoder::from_rule_files(&[filename.as_str()], 1)?;
  dec.set_pop_limit(pop_limit);
  if weights.is_empty() {
    dec.set_weights(uniform_weights(&dec));
  } else {
    dec.set_weights(FeatureVec::from_pairs(weights));
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        decode(&dec, input.trim(), print_forest)?;
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}

/// Weight 1 for every feature name the table uses
fn uniform_weights(dec: &Decoder) -> FeatureVec {
  let mut weights = FeatureVec::new();
  for rule in dec.table().iter_rules() {
    for (name, _) in rule.features.iter() {
      if weights.get(name) == 0.0 {
        weights.add(name, 1.0);
      }
    }
  }
  weights
}
