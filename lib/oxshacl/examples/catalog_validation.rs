//! Walks through validating a small product catalog.
//!
//! Run with: cargo run -p oxshacl --example catalog_validation

use oxrdf::Graph;
use oxrdfio::{RdfFormat, RdfParser};
use oxshacl::{ShaclValidator, ShapesGraph};

const SHAPES: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix ex: <http://example.org/catalog#> .

ex:ProductShape a sh:NodeShape ;
    sh:targetClass ex:Product ;
    sh:message "Product record is invalid" ;
    sh:property [
        sh:path ex:sku ;
        sh:minCount 1 ;
        sh:maxCount 1 ;
        sh:pattern "[A-Z]{2}-[0-9]{4}" ;
        sh:message "SKUs look like XY-1234" ;
    ] ;
    sh:property [
        sh:path ex:price ;
        sh:datatype xsd:integer ;
    ] ;
    sh:property [
        sh:path ex:label ;
        sh:languageIn ("en" "fr") ;
        sh:uniqueLang true ;
    ] ;
    sh:property [
        sh:path ex:maker ;
        sh:node ex:ManufacturerShape ;
    ] ;
    sh:property [
        sh:path ex:legacyId ;
        sh:minCount 1 ;
        sh:deactivated true ;
    ] .

ex:ManufacturerShape a sh:NodeShape ;
    sh:targetClass ex:Manufacturer ;
    sh:property [
        sh:path ex:country ;
        sh:minCount 1 ;
    ] .
"#;

const DATA: &str = r#"
@prefix ex: <http://example.org/catalog#> .

ex:acme a ex:Manufacturer ;
    ex:country "US" .
ex:shady ex:slogan "trust us" .

ex:widget a ex:Product ;
    ex:sku "WD-0001" ;
    ex:price 999 ;
    ex:label "Widget"@en, "Bidule"@fr ;
    ex:maker ex:acme .

ex:gadget a ex:Product ;
    ex:sku "gadget-1" ;
    ex:price "cheap" ;
    ex:label "Gadget"@en, "Gizmo"@en, "Dingsda"@de ;
    ex:maker ex:shady .
"#;

fn parse_turtle(turtle: &str) -> Graph {
    let mut graph = Graph::new();
    for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(turtle.as_bytes()) {
        graph.insert(quad.unwrap().as_ref());
    }
    graph
}

fn main() {
    let shapes = ShapesGraph::from_graph(&parse_turtle(SHAPES)).unwrap();
    println!("Parsed {} node shapes", shapes.len());
    for diagnostic in shapes.diagnostics() {
        println!("  note: {diagnostic}");
    }
    println!();

    let data = parse_turtle(DATA);
    let validator = ShaclValidator::new(shapes);
    let report = validator.validate(&data);

    println!("{}", "=".repeat(60));
    println!(
        "Conforms: {} ({} violations)",
        report.conforms(),
        report.len()
    );
    println!("{}", "=".repeat(60));
    for violation in report.violations() {
        println!("{violation}");
        if let Some(message) = violation.message("en") {
            println!("    {message}");
        }
    }
    for shape in report.skipped_shapes() {
        println!("skipped (no focus subjects): {shape}");
    }
    println!();

    println!("Report as RDF:");
    for triple in &report.to_graph() {
        println!("{triple} .");
    }
}
