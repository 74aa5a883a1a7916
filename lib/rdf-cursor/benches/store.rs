#![allow(clippy::panic, reason = "Benchmarks")]

use codspeed_criterion_compat::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use rdf_cursor::engine::QueryOptions;
use rdf_cursor::model::{GraphName, NamedNode, Quad, Subject, Term};
use rdf_cursor::results::QueryResults;
use rdf_cursor::store::Store;

fn store_load(c: &mut Criterion) {
    c.bench_function("Store::load", |b| {
        b.iter(|| {
            let store = Store::new();
            for quad in generate_quads(10_000) {
                store.insert(quad.as_ref()).unwrap();
            }
        });
    });
}

fn store_query(c: &mut Criterion) {
    let store = Store::new();
    store.extend(generate_quads(10_000)).unwrap();
    let mut rng = rand::rng();

    for index_join_strategy in [true, false] {
        let options = QueryOptions::default().with_index_join_strategy(index_join_strategy);
        let name = format!("Store::query (index join: {index_join_strategy})");
        c.bench_function(&name, |b| {
            b.iter(|| {
                let i = rng.random_range(0..10_000);
                let query = format!(
                    "SELECT ?o ?next WHERE {{ <http://example.com/subject{i}> ?p ?o . OPTIONAL {{ ?o ?q ?next }} }}"
                );
                let QueryResults::Solutions(solutions) =
                    store.query_opt(query.as_str(), options.clone()).unwrap()
                else {
                    panic!("Expected solutions");
                };
                assert_eq!(solutions.count(), 1);
            });
        });
    }
}

criterion_group!(store, store_load, store_query);
criterion_main!(store);

fn generate_quads(count: u64) -> impl Iterator<Item = Quad> {
    (0..count).map(|i| {
        let subject = format!("http://example.com/subject{i}");
        let predicate = format!("http://example.com/predicate{i}");
        let object = format!("http://example.com/object{i}");
        Quad::new(
            Subject::NamedNode(NamedNode::new_unchecked(subject)),
            NamedNode::new_unchecked(predicate),
            Term::NamedNode(NamedNode::new_unchecked(object)),
            GraphName::DefaultGraph,
        )
    })
}
