use kaizen_utils::is_safe_regex;
use kaizen_utils::regexp::{
    Direction, PathCount, SAFE_PATH_LIMIT, max_possible_paths, parse_literal,
};

fn paths(literal: &str, direction: Direction) -> PathCount {
    let parsed = parse_literal(literal).expect("valid regex");
    max_possible_paths(&parsed.pattern, direction)
}

#[test]
fn path_counts() {
    let cases: &[(&str, PathCount)] = &[
        ("/[]/", 0.0),
        ("/[]+/", 0.0),
        ("/[]a+/", 0.0),
        ("/a/", 1.0),
        ("/foobar/", 1.0),
        ("/^foobar$/", 1.0),
        ("/a(?!foo)/", 1.0),
        ("/(?:a*a*a*a*){0}/", 1.0),
        ("/a|b/", 2.0),
        ("/a?/", 2.0),
        ("/a{2,4}/", 3.0),
        ("/(a|b){2,4}/", 28.0),
        ("/(a|b|c){2,4}/", 117.0),
        ("/(a|b){10}/v", 1024.0),
        ("/(a+)b\\1/", f64::INFINITY),
        ("/(?:a|a)+b/", f64::INFINITY),
        ("/b+$/", f64::INFINITY),
        ("/(?:a+){3}/", f64::INFINITY),
    ];

    for &(literal, expected) in cases {
        assert_eq!(paths(literal, Direction::Ltr), expected, "{literal}");
    }
}

#[test]
fn direction_decides_which_element_short_circuits() {
    assert_eq!(paths("/[]b+/", Direction::Ltr), 0.0);
    assert_eq!(paths("/[]b+/", Direction::Rtl), f64::INFINITY);
}

#[test]
fn safety_threshold() {
    assert_eq!(SAFE_PATH_LIMIT, 100.0);
    assert!(is_safe_regex("/(a|b){6}/"));
    assert!(!is_safe_regex("/(a|b){7}/"));
    assert!(is_safe_regex("/[]a+/"));
    assert!(!is_safe_regex("/^(\\w+\\s?)*$/"));
}

#[test]
fn invalid_literals_are_unsafe() {
    assert!(parse_literal("/foo[a-/u").is_err());
    assert!(!is_safe_regex("/foo[a-/u"));
    assert!(!is_safe_regex("not a literal"));
}
