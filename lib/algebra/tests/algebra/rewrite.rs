use rdf_cursor_algebra::{AlgebraGenerator, Op};
use rdf_cursor_model::{GraphPattern, Query};

fn translate(query: &str) -> Op {
    let Query::Select { pattern, .. } = Query::parse(query, None).unwrap() else {
        panic!("Expected a SELECT query")
    };
    AlgebraGenerator::new().translate(&pattern).unwrap()
}

#[test]
fn test_translate_filter_over_bgp() {
    let op = translate(
        "SELECT ?x ?y ?z WHERE {
            ?x <http://example.com/p> ?y .
            ?y <http://example.com/q> ?z .
            FILTER(?y = <http://example.com/b>)
        }",
    );

    insta::assert_snapshot!(op, @r"
    (project (?x ?y ?z)
      (filter (= ?y <http://example.com/b>)
        (bgp (?x <http://example.com/p> ?y) (?y <http://example.com/q> ?z))))
    ");
}

#[test]
fn test_translate_conjunction_is_split() {
    let op = translate(
        "SELECT ?x WHERE {
            ?x <http://example.com/p> ?y .
            FILTER(BOUND(?x) && BOUND(?y))
        }",
    );

    insta::assert_snapshot!(op, @r"
    (project (?x)
      (filter (exprlist (bound ?x) (bound ?y))
        (bgp (?x <http://example.com/p> ?y))))
    ");
}

#[test]
fn test_translate_union_and_minus() {
    let op = translate(
        "SELECT ?x WHERE {
            { ?x <http://example.com/p> ?y } UNION { ?x <http://example.com/q> ?y }
            MINUS { ?x <http://example.com/r> ?y }
        }",
    );

    insta::assert_snapshot!(op, @r"
    (project (?x)
      (minus
        (union
          (bgp (?x <http://example.com/p> ?y))
          (bgp (?x <http://example.com/q> ?y)))
        (bgp (?x <http://example.com/r> ?y))))
    ");
}

#[test]
fn test_translate_single_predicate_paths_to_bgp() {
    let op = translate("SELECT ?x ?y WHERE { ?x ^<http://example.com/p> ?y }");

    insta::assert_snapshot!(op, @r"
    (project (?x ?y)
      (bgp (?y <http://example.com/p> ?x)))
    ");
}

#[test]
fn test_translate_complex_path() {
    let op = translate("SELECT ?x ?y WHERE { ?x <http://example.com/p>+ ?y }");

    insta::assert_snapshot!(op, @r"
    (project (?x ?y)
      (path ?x (path+ <http://example.com/p>) ?y))
    ");
}

#[test]
fn test_translate_empty_bgp_is_unit_table() {
    let op = AlgebraGenerator::new()
        .translate(&GraphPattern::Bgp {
            patterns: Vec::new(),
        })
        .unwrap();

    insta::assert_snapshot!(op, @"(table unit)");
}
