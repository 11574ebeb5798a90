use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use goterms::Ontology;

/// Builds a document with a binary tree of `n` terms below `biological_process`
fn synthetic_obo(n: usize) -> String {
    let mut obo = String::from("format-version: 1.2\n\n[Term]\nid: GO:0000001\nname: biological_process\n");
    for idx in 2..=n {
        obo.push_str(&format!(
            "\n[Term]\nid: GO:{idx:07}\nname: process {idx}\nnamespace: biological_process\ndef: \"Term number {idx}.\" [GOC:bench]\nis_a: GO:{:07}\n",
            idx / 2
        ));
        if idx > 3 {
            obo.push_str(&format!("relationship: part_of GO:{:07}\n", idx / 2 - 1));
        }
    }
    obo
}

fn parse_benchmark(c: &mut Criterion) {
    let obo = synthetic_obo(20_000);
    c.bench_function("parse obo", |b| {
        b.iter(|| {
            Ontology::from_obo_str(black_box(&obo))
                .expect("requires valid obo")
                .len()
        })
    });
}

fn binary_benchmark(c: &mut Criterion) {
    let bytes = Ontology::from_obo_str(&synthetic_obo(20_000))
        .expect("requires valid obo")
        .as_bytes()
        .expect("ontology can be serialized");
    c.bench_function("load binary", |b| {
        b.iter(|| {
            Ontology::from_bytes(black_box(&bytes[..]))
                .expect("requires valid bytes")
                .len()
        })
    });
}

criterion_group! {
    name = parser;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(10));
    targets = parse_benchmark, binary_benchmark
}
criterion_main!(parser);
