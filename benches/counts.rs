use criterion::{black_box, criterion_group, criterion_main, Criterion};
use goterms::{Ontology, RootOntology};

fn synthetic_ontology(n: usize) -> Ontology {
    let mut obo = String::from("[Term]\nid: GO:0000001\nname: biological_process\n");
    for idx in 2..=n {
        obo.push_str(&format!(
            "\n[Term]\nid: GO:{idx:07}\nis_a: GO:{:07}\n",
            idx / 2
        ));
        if idx > 3 {
            obo.push_str(&format!("is_a: GO:{:07}\n", idx / 2 - 1));
        }
    }
    Ontology::from_obo_str(&obo).expect("requires valid obo")
}

fn add_count_benchmark(c: &mut Criterion) {
    for genes in [100usize, 1_000] {
        let mut ontology = synthetic_ontology(10_000);
        let annotations: Vec<Vec<String>> = (0..genes)
            .map(|gene| {
                (0..5)
                    .map(|term| format!("GO:{:07}", (gene * 37 + term * 1_001) % 9_999 + 2))
                    .collect()
            })
            .collect();
        c.bench_function(&format!("add_count {genes} genes"), |b| {
            b.iter(|| {
                ontology.reset_counts();
                for terms in &annotations {
                    ontology.add_count(RootOntology::Biological, true, false, 1, terms);
                }
                for terms in annotations.iter().step_by(10) {
                    ontology.add_count(RootOntology::Biological, true, true, 1, terms);
                }
                black_box(ontology.calculate_enrichment(RootOntology::Biological))
            })
        });
    }
}

criterion_group!(counts, add_count_benchmark);
criterion_main!(counts);
