use crate::languages::{expression, numeric};
use crate::{CacheConfig, Options, parse_verbose_with, parse_with};

#[test]
fn number_literals_matching() {
    // Array of (expected_value, input_string)
    let cases: Vec<(f64, &str)> = vec![
        (0.0, "0"),
        (42.0, "42"),
        (42.0, "0042"),
        (-7.0, "-7"),
        (7.0, "+7"),
        (1.5, "1.5"),
        (0.25, "0.25"),
        (-0.125, "-0.125"),
        (1e3, "1e3"),
        (1e3, "1E3"),
        (1e3, "1e+3"),
        (1e-3, "1e-3"),
        (2.5e10, "2.5e10"),
        (-6.02e23, "-6.02E+23"),
    ];
    for (expected, input) in cases {
        let value = numeric::parse_value(input).unwrap_or_else(|errs| panic!("{input:?}: {errs:?}"));
        assert!((value - expected).abs() <= f64::EPSILON * expected.abs().max(1.0), "{input:?} -> {value}");
    }
}

#[test]
fn incomplete_suffixes_are_not_part_of_the_literal() {
    // Array of (input_string, matched_prefix)
    let cases: Vec<(&str, &str)> = vec![
        ("1e", "1"),
        ("1e+", "1"),
        ("2E-x", "2"),
        ("3.", "3"),
        ("3.e5", "3"),
        ("4.5e", "4.5"),
        ("-1x", "-1"),
    ];
    for (input, prefix) in cases {
        let res = numeric::grammar().parse(input);
        let tree = res.tree.unwrap_or_else(|| panic!("{input:?} produced no tree"));
        assert_eq!(tree.text(input), prefix, "{input:?}");
        assert_eq!(res.consumed, prefix.len(), "{input:?}");
        assert_eq!(res.errors.len(), 1, "{input:?} should report the trailing input");
    }
}

#[test]
fn number_literals_not_matching() {
    for input in ["", "-", "+", ".5", "e5", "x1", " 1"] {
        assert!(numeric::parse_value(input).is_err(), "{input:?} should not parse");
    }
}

#[test]
fn number_node_structure() {
    let source = "-12.5e3";
    let tree = crate::parse(numeric::grammar(), source).unwrap();
    assert_eq!(tree.token.name(), "number");
    let parts: Vec<(&str, &str)> = tree.children.iter().map(|n| (n.token.name(), n.text(source))).collect();
    assert_eq!(parts, vec![("integer", "12"), ("fraction", ".5"), ("exponent", "e3")]);

    let tree = crate::parse(numeric::grammar(), "7").unwrap();
    assert_eq!(tree.children.len(), 1);
}

#[test]
fn expression_examples() {
    // Array of (expected_value, input_string)
    let cases: Vec<(f64, &str)> = vec![
        (42.0, "42"),
        (3.0, "1+2"),
        (-1.0, "1-2"),
        (3.0, "1 - -2"),
        (7.0, "1 + 2 * 3"),
        (9.0, "(1 + 2) * 3"),
        (14.0, "2 * (3 + 4)"),
        (2.0, "8 / 2 / 2"),
        (0.0, "10 - 4 - 6"),
        (-6.0, "2*-3"),
        (21.0, "((((21))))"),
        (1.5, "  3 / ( 1 +\n 1 )  "),
        (2000.5, "2e3 + 0.5"),
    ];
    for (expected, input) in cases {
        let value = expression::calculate(input).unwrap_or_else(|errs| panic!("{input:?}: {errs:?}"));
        assert_eq!(value, expected, "{input:?}");
    }
}

#[test]
fn expression_tree_shape() {
    let source = "2 * (3 + 4)";
    let tree = crate::parse(expression::grammar(), source).unwrap();
    let expected = "\
product 0..11
    number 0..1
        integer 0..1 '2'
    operator 2..3 '*'
    sum 5..10
        number 5..6
            integer 5..6 '3'
        operator 7..8 '+'
        number 9..10
            integer 9..10 '4'
";
    assert_eq!(tree.describe(source), expected);
}

#[test]
fn expression_errors() {
    let res = expression::grammar().parse("(1 + 2");
    assert!(!res.is_success());
    assert!(res.render_errors().contains("expected ')' to close the group"), "{}", res.render_errors());

    let res = expression::grammar().parse("1 +");
    assert_eq!(res.consumed, 2);
    assert_eq!(res.errors.len(), 1);
    assert_eq!(res.errors[0].range().start, 2);

    assert!(expression::calculate("").is_err());
    assert!(expression::calculate("()").is_err());
}

#[test]
fn deeply_nested_groups() {
    // Spawned threads get the default 2 MiB stack.
    let value = std::thread::spawn(|| {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        expression::calculate(&source)
    })
    .join()
    .unwrap();
    assert_eq!(value, Ok(1.0));

    let unbalanced = format!("{}1{}", "(".repeat(200), ")".repeat(199));
    assert!(std::thread::spawn(move || expression::calculate(&unbalanced)).join().unwrap().is_err());
}

#[test]
fn expression_cache_is_transparent() {
    let inputs = ["1 + 2 * 3 - 4 / 5", "((1))", "(1 + 2", "2 * (3 + 4) * (5 - 6)"];
    for input in inputs {
        let plain = parse_with(expression::grammar(), input, &Options::default());
        let options = Options::default().with_cache(CacheConfig::default());
        let cached = parse_verbose_with(expression::grammar(), input, &options);
        assert_eq!(plain.tree, cached.tree, "{input:?}");
        assert_eq!(plain.errors, cached.errors, "{input:?}");
        assert_eq!(plain.consumed, cached.consumed, "{input:?}");
        if plain.errors.is_empty() {
            assert!(cached.details.metrics.cache.hits > 0, "{input:?}");
        }
    }
}

#[test]
fn expression_streaming() {
    // Roots are retried until input runs out, so each expression is its own item.
    let source = "1 2*3 (4)";
    let values: Vec<f64> = crate::tokens(expression::grammar(), source, &Options::default())
        .map(|node| expression::evaluate(&node.unwrap(), source).unwrap())
        .collect();
    assert_eq!(values, vec![1.0, 6.0, 4.0]);
}
