use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spanforge::decoder::Decoder;
use spanforge::features::FeatureVec;
use spanforge::lm::{BigramLm, LmModel};
use spanforge::RuleTable;

const RULES: &str = r#"
  X ||| der ||| the ||| p=-0.5
  X ||| hund ||| dog ||| p=-0.5
  X ||| die ||| the ||| p=-0.25
  X ||| katze ||| cat ||| p=-0.5
  X ||| der hund ||| the dog ||| p=-0.25
  X ||| die katze ||| the cat ||| p=-0.25
  X ||| x0:X x1:X ||| x0 x1 ||| p=-1
  S ||| x0:X sah x1:X ||| x0 saw x1 ||| p=-0.5
  S ||| x0:X lief ||| x0 ran ||| p=-0.5
"#;

fn decoder() -> Decoder {
  let table: RuleTable = RULES.parse().unwrap();

  let mut lm = BigramLm::new(-20.0);
  let the = table.dict.lookup("the").unwrap();
  let dog = table.dict.lookup("dog").unwrap();
  let cat = table.dict.lookup("cat").unwrap();
  let saw = table.dict.lookup("saw").unwrap();
  let ran = table.dict.lookup("ran").unwrap();
  for w in [the, dog, cat, saw, ran] {
    lm.add_unigram(w, -2.0);
  }
  lm.add_bigram(the, dog, -0.5);
  lm.add_bigram(the, cat, -0.5);
  lm.add_bigram(dog, saw, -1.0);
  lm.add_bigram(cat, ran, -1.0);

  let mut dec = Decoder::new(table);
  dec.set_weights(FeatureVec::from_pairs([("p", 1.0)]));
  dec.add_lm(LmModel::new(Box::new(lm), 0.5)).unwrap();
  dec.set_pop_limit(Some(50));
  dec
}

fn best_score(dec: &Decoder, sentence: &str) -> f64 {
  let sent = dec.sentence_ids(sentence);
  let forest = dec.decode(&sent).unwrap();
  forest
    .best_node_for((0, sent.len() - 1), dec.root_label())
    .map(|root| forest.node(root).viterbi)
    .unwrap_or(f64::NEG_INFINITY)
}

fn criterion_benchmark(c: &mut Criterion) {
  let dec = decoder();
  let short = "der hund lief";
  let long = "der hund sah die katze";

  c.bench_function("decode short", |b| {
    b.iter(|| best_score(black_box(&dec), black_box(short)))
  });

  c.bench_function("decode long", |b| {
    b.iter(|| best_score(black_box(&dec), black_box(long)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
