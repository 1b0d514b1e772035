use pretty_assertions::assert_eq;
use sparql_select::prelude::*;

fn foaf_query() -> SelectQuery {
    SelectQuery::with_prefixes([("foaf", "<http://xmlns.com/foaf/0.1/>")])
        .expect("foaf prefix is valid")
}

#[test]
fn test_end_to_end_text() {
    let mut query = foaf_query();
    query
        .select(["?name"])
        .unwrap()
        .where_("?person", "foaf:name", "?name")
        .unwrap();

    let text = query.to_text().unwrap();
    assert_eq!(
        text,
        "PREFIX foaf: <http://xmlns.com/foaf/0.1/> SELECT ?name WHERE { ?person foaf:name ?name . }"
    );
    assert_eq!(query.render(true).unwrap(), text);
}

#[test]
fn test_variable_validated_twice_is_recorded_once() {
    let mut validator = ExpressionValidator::new();
    for token in ["?x", "?x", "$x"] {
        assert_eq!(validator.classify(token, Accept::all()).unwrap(), Category::Variable);
    }
    assert_eq!(validator.variables().iter().collect::<Vec<_>>(), vec!["x"]);
}

#[test]
fn test_mask_gating_is_exclusive() {
    let cases = [
        ("?x", Accept::all() - Accept::VARIABLE - Accept::FUNCTION),
        ("<http://example.org/>", Accept::VARIABLE | Accept::PREFIXED_IRI),
        ("foaf:name", Accept::IRI | Accept::PREFIX),
        ("foaf", Accept::VARIABLE | Accept::IRI | Accept::PREFIXED_IRI),
        ("COUNT(?x) AS ?n", Accept::VARIABLE | Accept::PREFIX),
    ];
    for (token, accept) in cases {
        let mut validator = ExpressionValidator::new();
        let err = validator.classify(token, accept).unwrap_err();
        assert!(matches!(err, QueryError::NoCategoryMatched { .. }), "{token}");
    }
}

#[test]
fn test_precedence_prefix_before_function() {
    let mut validator = ExpressionValidator::new();
    assert_eq!(
        validator.classify("COUNT", Accept::PREFIX | Accept::FUNCTION).unwrap(),
        Category::Prefix
    );
}

#[test]
fn test_precedence_function_before_function_as() {
    let mut validator = ExpressionValidator::new();
    assert_eq!(
        validator
            .classify("COUNT(?x) AS ?n", Accept::FUNCTION | Accept::FUNCTION_AS)
            .unwrap(),
        Category::Function
    );
    // Plain function harvesting also leaves out the AS target.
    assert_eq!(validator.variables().iter().collect::<Vec<_>>(), vec!["x"]);
}

#[test]
fn test_self_and_cyclic_subqueries() {
    let mut a = SelectQuery::new();
    let mut b = SelectQuery::new();
    let a_again = a.clone();

    assert!(matches!(a.subquery(&a_again), Err(QueryError::SelfReference)));
    a.subquery(&b).unwrap();
    assert!(matches!(b.subquery(&a), Err(QueryError::CyclicSubquery)));
    assert!(a.contains_subquery(&b));
}

#[test]
fn test_undefined_variable_on_render() {
    let mut query = SelectQuery::new();
    query.select(["?x"]).unwrap();
    match query.render(true) {
        Err(QueryError::UndefinedVariable(names)) => assert_eq!(names, vec!["x"]),
        other => panic!("expected UndefinedVariable, got {:?}", other),
    }
}

#[test]
fn test_undefined_prefix_on_render() {
    let mut query = SelectQuery::new();
    query.where_("?person", "foaf:name", "?name").unwrap();
    match query.render(true) {
        Err(QueryError::UndefinedPrefix(names)) => assert_eq!(names, vec!["foaf"]),
        other => panic!("expected UndefinedPrefix, got {:?}", other),
    }
}

#[test]
fn test_select_star() {
    let mut query = foaf_query();
    query.where_("?person", "a", "foaf:Person").unwrap();
    assert_eq!(
        query.render(false).unwrap(),
        "SELECT * WHERE { ?person a foaf:Person . }"
    );
}

#[test]
fn test_nested_subqueries_render_once_each() {
    let mut parent = foaf_query();

    let mut first = parent.new_subquery();
    first.select(["?p"]).unwrap().where_("?p", "a", "foaf:Person").unwrap();

    let mut second = parent.new_subquery();
    second.prefix("foaf", "<http://xmlns.com/foaf/0.1/>").unwrap();
    second.select(["?n"]).unwrap().where_("?p", "foaf:name", "?n").unwrap();

    parent
        .subquery(&first)
        .unwrap()
        .subquery(&second)
        .unwrap()
        .select(["?p", "?n"])
        .unwrap();

    assert_eq!(
        second.render(false).unwrap(),
        "SELECT ?n WHERE { ?p foaf:name ?n . }"
    );

    let text = parent.to_text().unwrap();
    assert_eq!(
        text,
        "PREFIX foaf: <http://xmlns.com/foaf/0.1/> SELECT ?p ?n WHERE { \
         { SELECT ?p WHERE { ?p a foaf:Person . } } \
         { SELECT ?n WHERE { ?p foaf:name ?n . } } }"
    );
    assert_eq!(text.matches("PREFIX").count(), 1);
}

#[test]
fn test_prefix_snapshot_is_not_live() {
    let mut parent = SelectQuery::new();
    let mut child = parent.new_subquery();
    parent.prefix("ex", "<http://example.org/>").unwrap();

    child.where_("?s", "ex:p", "?o").unwrap();
    assert!(matches!(child.render(false), Err(QueryError::UndefinedPrefix(_))));

    parent.subquery(&child).unwrap();
    assert!(matches!(parent.to_text(), Err(QueryError::UndefinedPrefix(_))));
}

#[test]
fn test_filters_and_modifiers() {
    let mut query = SelectQuery::with_prefixes([
        ("ex", "<http://example.org/>"),
        ("xsd", "<http://www.w3.org/2001/XMLSchema#>"),
    ])
    .unwrap();
    query
        .select(["?city", "AVG(?pop) AS ?avg"])
        .unwrap()
        .where_("?city", "ex:population", "?pop")
        .unwrap()
        .also(("ex:country", "?country"))
        .unwrap()
        .filter("?pop > \"100000\"^^xsd:integer")
        .unwrap()
        .group_by("?city")
        .unwrap()
        .having("AVG(?pop) > 1000")
        .unwrap()
        .order_by("?avg", Direction::Desc)
        .unwrap()
        .limit(3)
        .offset(6);

    assert_eq!(
        query.to_text().unwrap(),
        "PREFIX ex: <http://example.org/> PREFIX xsd: <http://www.w3.org/2001/XMLSchema#> \
         SELECT ?city (AVG(?pop) AS ?avg) WHERE { \
         ?city ex:population ?pop ; ex:country ?country . \
         FILTER (?pop > \"100000\"^^xsd:integer) } \
         GROUP BY ?city HAVING (AVG(?pop) > 1000) ORDER BY DESC(?avg) LIMIT 3 OFFSET 6"
    );
}

#[test]
fn test_failed_render_leaves_query_usable() {
    let mut query = SelectQuery::new();
    query.select(["?x"]).unwrap();
    assert!(query.to_text().is_err());
    query.where_("?x", "?p", "?o").unwrap();
    assert_eq!(query.to_text().unwrap(), "SELECT ?x WHERE { ?x ?p ?o . }");
}

#[test]
fn test_pretty_output() {
    let mut query = foaf_query();
    query
        .select(["?name"])
        .unwrap()
        .where_("?person", "foaf:name", "?name")
        .unwrap()
        .limit(1);

    assert_eq!(
        query.format().unwrap(),
        "PREFIX foaf: <http://xmlns.com/foaf/0.1/>\nSELECT ?name WHERE {\n  ?person foaf:name ?name .\n}\nLIMIT 1"
    );
}

#[test]
fn test_rejected_triple_binds_no_variables() {
    let mut query = SelectQuery::new();
    query.select(["?x"]).unwrap();
    assert!(matches!(
        query.where_("?x", "?p", "not a term"),
        Err(QueryError::NoCategoryMatched { .. })
    ));
    assert!(query.graph().is_empty());
    match query.to_text() {
        Err(QueryError::UndefinedVariable(names)) => assert_eq!(names, vec!["x"]),
        other => panic!("expected UndefinedVariable, got {:?}", other),
    }
}
