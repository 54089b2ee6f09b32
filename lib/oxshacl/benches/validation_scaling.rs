//! Benchmark suite for validation scaling analysis.
//!
//! The groups separate the three cost drivers: total graph size, number of
//! focus subjects, and sh:node reference depth.
//!
//! Run with: cargo bench -p oxshacl validation_scaling

use codspeed_criterion_compat::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Graph, Literal, NamedNode, Triple};
use oxshacl::vocab::shacl;
use oxshacl::{ShaclValidator, ShapesGraph};

fn named(iri: &str) -> NamedNode {
    NamedNode::new(iri).unwrap()
}

/// A shape requiring a name on every Person.
fn person_shapes() -> ShapesGraph {
    let mut shapes_graph = Graph::new();
    let shape = named("http://example.org/PersonShape");
    let property = BlankNode::default();

    shapes_graph.insert(&Triple::new(shape.clone(), rdf::TYPE, shacl::NODE_SHAPE));
    shapes_graph.insert(&Triple::new(
        shape.clone(),
        shacl::TARGET_CLASS,
        named("http://example.org/Person"),
    ));
    shapes_graph.insert(&Triple::new(shape, shacl::PROPERTY, property.clone()));
    shapes_graph.insert(&Triple::new(
        property.clone(),
        shacl::PATH,
        named("http://example.org/name"),
    ));
    shapes_graph.insert(&Triple::new(
        property,
        shacl::MIN_COUNT,
        Literal::new_typed_literal("1", xsd::INTEGER),
    ));

    ShapesGraph::from_graph(&shapes_graph).unwrap()
}

/// A data graph mixing targeted Person subjects with untargeted noise.
fn mixed_graph(person_count: usize, thing_count: usize) -> Graph {
    let mut graph = Graph::new();
    let person_class = named("http://example.org/Person");
    let thing_class = named("http://example.org/Thing");
    let name = named("http://example.org/name");
    let value = named("http://example.org/value");

    for i in 0..person_count {
        let person = named(&format!("http://example.org/person{i}"));
        graph.insert(&Triple::new(person.clone(), rdf::TYPE, person_class.clone()));
        graph.insert(&Triple::new(
            person,
            name.clone(),
            Literal::new_simple_literal(format!("Person {i}")),
        ));
    }
    for i in 0..thing_count {
        let thing = named(&format!("http://example.org/thing{i}"));
        graph.insert(&Triple::new(thing.clone(), rdf::TYPE, thing_class.clone()));
        graph.insert(&Triple::new(
            thing,
            value.clone(),
            Literal::new_simple_literal(format!("Thing {i}")),
        ));
    }

    graph
}

/// A linear chain of shapes linked through sh:node plus conforming chain data.
fn chain(depth: usize) -> (ShapesGraph, Graph) {
    let mut shapes_graph = Graph::new();
    for i in 0..depth {
        let shape = named(&format!("http://example.org/Shape{i}"));
        let property = named(&format!("http://example.org/Shape{i}Rule"));
        shapes_graph.insert(&Triple::new(shape.clone(), rdf::TYPE, shacl::NODE_SHAPE));
        if i == 0 {
            shapes_graph.insert(&Triple::new(
                shape.clone(),
                shacl::TARGET_NODE,
                named("http://example.org/n0"),
            ));
        } else {
            shapes_graph.insert(&Triple::new(
                shape.clone(),
                shacl::TARGET_CLASS,
                named("http://example.org/Phantom"),
            ));
        }
        shapes_graph.insert(&Triple::new(shape, shacl::PROPERTY, property.clone()));
        if i + 1 < depth {
            shapes_graph.insert(&Triple::new(
                property.clone(),
                shacl::PATH,
                named("http://example.org/next"),
            ));
            shapes_graph.insert(&Triple::new(
                property,
                shacl::NODE,
                named(&format!("http://example.org/Shape{}", i + 1)),
            ));
        } else {
            shapes_graph.insert(&Triple::new(
                property.clone(),
                shacl::PATH,
                named("http://example.org/name"),
            ));
            shapes_graph.insert(&Triple::new(
                property,
                shacl::MIN_COUNT,
                Literal::new_typed_literal("1", xsd::INTEGER),
            ));
        }
    }

    let mut data = Graph::new();
    for i in 0..depth - 1 {
        data.insert(&Triple::new(
            named(&format!("http://example.org/n{i}")),
            named("http://example.org/next"),
            named(&format!("http://example.org/n{}", i + 1)),
        ));
    }
    data.insert(&Triple::new(
        named(&format!("http://example.org/n{}", depth - 1)),
        named("http://example.org/name"),
        Literal::new_simple_literal("end"),
    ));

    (ShapesGraph::from_graph(&shapes_graph).unwrap(), data)
}

/// Constant focus subjects, growing noise. Cost should track target discovery,
/// not total validation work.
fn bench_validation_vs_graph_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation_vs_graph_size");
    let validator = ShaclValidator::new(person_shapes());

    for thing_count in [0, 1_000, 10_000, 50_000] {
        let graph = mixed_graph(10, thing_count);
        let total_triples = graph.len();

        group.throughput(Throughput::Elements(total_triples as u64));
        group.bench_with_input(
            BenchmarkId::new("graph_size", total_triples),
            &graph,
            |b, g| {
                b.iter(|| black_box(validator.validate(black_box(g))));
            },
        );
    }

    group.finish();
}

/// Growing focus subjects over an otherwise empty graph.
fn bench_validation_vs_focus_subjects(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation_vs_focus_subjects");
    let validator = ShaclValidator::new(person_shapes());

    for person_count in [10, 100, 1_000, 10_000] {
        let graph = mixed_graph(person_count, 0);

        group.throughput(Throughput::Elements(person_count as u64));
        group.bench_with_input(
            BenchmarkId::new("focus_subjects", person_count),
            &graph,
            |b, g| {
                b.iter(|| black_box(validator.validate(black_box(g))));
            },
        );
    }

    group.finish();
}

/// Growing sh:node chain depth with a single focus subject.
fn bench_validation_vs_reference_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation_vs_reference_depth");

    for depth in [2, 8, 32, 128] {
        let (shapes, data) = chain(depth);
        let validator = ShaclValidator::new(shapes);

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("depth", depth), &data, |b, g| {
            b.iter(|| black_box(validator.validate(black_box(g))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_validation_vs_graph_size,
    bench_validation_vs_focus_subjects,
    bench_validation_vs_reference_depth
);
criterion_main!(benches);
