//! Sanitizer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dtm_parser::{parse_document, sanitize};

const SIMPLE_DOC: &str = r##"{
  // brand palette
  "color": {
    "brand": { "$type": "color", "$value": "#336699", },
    "accent": { "$type": "color", "$value": "{color.brand}" }, /* alias */
  },
}"##;

fn medium_doc() -> String {
    let mut doc = String::from("{\n  \"spacing\": {\n");
    for i in 0..500 {
        doc.push_str(&format!(
            "    \"s{i}\": {{ \"$type\": \"dimension\", \"$value\": \"{i}px\" }}, // step {i}\n"
        ));
    }
    doc.push_str("  },\n}\n");
    doc
}

fn sanitize_simple(c: &mut Criterion) {
    c.bench_function("sanitize_simple", |b| b.iter(|| sanitize(black_box(SIMPLE_DOC))));
}

fn parse_medium(c: &mut Criterion) {
    let doc = medium_doc();
    c.bench_function("parse_medium", |b| {
        b.iter(|| parse_document(black_box(&doc), false))
    });
}

criterion_group!(benches, sanitize_simple, parse_medium);
criterion_main!(benches);
