use sketchc::paths::extract_paths;

use sketch_program::{branch, call, except, expected, loop_, nodes, steps};

#[test]
fn single_call_yields_one_path() {
    let ns = nodes(vec![call("foo()")]);
    let paths = extract_paths(&ns).expect("straight-line sketch must extract");
    assert_eq!(paths.len(), 1);
    assert_eq!(
        steps(&paths[0]),
        expected(&[("foo()", false), ("stop", false)])
    );
}

#[test]
fn empty_sequence_yields_terminal_only() {
    let paths = extract_paths(&[]).expect("empty sketch must extract");
    assert_eq!(paths.len(), 1);
    assert_eq!(steps(&paths[0]), expected(&[("stop", false)]));
}

#[test]
fn branch_skip_path_comes_before_enter_path() {
    let ns = nodes(vec![branch(
        vec![call("c()")],
        vec![call("t()")],
        vec![],
    )]);
    let paths = extract_paths(&ns).expect("branch sketch must extract");
    assert_eq!(paths.len(), 2);
    assert_eq!(
        steps(&paths[0]),
        expected(&[("branch", false), ("stop", false)]),
        "horizontal (skip) path must be enumerated first"
    );
    assert_eq!(
        steps(&paths[1]),
        expected(&[("branch", true), ("c()", false), ("t()", false), ("stop", false)])
    );
}

#[test]
fn branch_combines_then_and_else_routes() {
    let ns = nodes(vec![branch(
        vec![call("c()")],
        vec![call("t()")],
        vec![call("e()")],
    )]);
    let paths = extract_paths(&ns).expect("branch sketch must extract");
    // Skip path, then the single then+else combination.
    assert_eq!(paths.len(), 2);
    assert_eq!(
        steps(&paths[1]),
        expected(&[
            ("branch", true),
            ("c()", false),
            ("t()", false),
            ("e()", false),
            ("stop", false),
        ])
    );
}

#[test]
fn leading_calls_prefix_every_path() {
    let ns = nodes(vec![
        call("a()"),
        call("b()"),
        loop_(vec![call("c()")], vec![call("body()")]),
    ]);
    let paths = extract_paths(&ns).expect("loop sketch must extract");
    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert_eq!(path[0].label, "a()");
        assert_eq!(path[1].label, "b()");
    }
    assert_eq!(
        steps(&paths[0])[2..],
        expected(&[("loop", false), ("stop", false)])[..]
    );
    assert_eq!(
        steps(&paths[1])[2..],
        expected(&[("loop", true), ("c()", false), ("body()", false), ("stop", false)])[..]
    );
}

#[test]
fn except_enumerates_try_then_catch() {
    let ns = nodes(vec![except(vec![call("risky()")], vec![call("recover()")])]);
    let paths = extract_paths(&ns).expect("except sketch must extract");
    assert_eq!(paths.len(), 2);
    assert_eq!(
        steps(&paths[0]),
        expected(&[("except", false), ("stop", false)])
    );
    assert_eq!(
        steps(&paths[1]),
        expected(&[
            ("except", true),
            ("risky()", false),
            ("recover()", false),
            ("stop", false),
        ])
    );
}

#[test]
fn entering_a_compound_ends_the_route() {
    // The sibling continuation belongs to the skip paths only: a route that
    // enters the first branch finishes there and never reaches the second.
    let ns = nodes(vec![
        branch(vec![call("c1()")], vec![call("t1()")], vec![]),
        branch(vec![call("c2()")], vec![call("t2()")], vec![]),
    ]);
    let paths = extract_paths(&ns).expect("two-branch sketch must extract");
    assert_eq!(paths.len(), 3);
    assert_eq!(
        steps(&paths[0]),
        expected(&[("branch", false), ("branch", false), ("stop", false)])
    );
    assert_eq!(
        steps(&paths[1]),
        expected(&[
            ("branch", false),
            ("branch", true),
            ("c2()", false),
            ("t2()", false),
            ("stop", false),
        ])
    );
    assert_eq!(
        steps(&paths[2]),
        expected(&[("branch", true), ("c1()", false), ("t1()", false), ("stop", false)])
    );
    for path in &paths {
        let stops = path.iter().filter(|s| s.label == "stop").count();
        assert_eq!(stops, 1, "exactly one terminal per path: {:?}", steps(path));
        assert_eq!(path.last().expect("non-empty").label, "stop");
    }
}

#[test]
fn multiple_then_paths_attach_else_to_the_first_only() {
    // then contains its own branch, so it yields two paths; the else route
    // continues only the first of them.
    let ns = nodes(vec![branch(
        vec![call("c()")],
        vec![branch(vec![call("ci()")], vec![call("ti()")], vec![])],
        vec![call("e()")],
    )]);
    let paths = extract_paths(&ns).expect("nested branch sketch must extract");
    let rendered: Vec<Vec<(String, bool)>> = paths.iter().map(steps).collect();

    // Horizontal first.
    assert_eq!(rendered[0], expected(&[("branch", false), ("stop", false)]));
    // First then-path (inner skip) + else route.
    assert!(
        rendered.contains(&expected(&[
            ("branch", true),
            ("c()", false),
            ("branch", false),
            ("e()", false),
            ("stop", false),
        ])),
        "missing inner-skip+else route: {rendered:?}"
    );
    // Second then-path (inner enter) stands alone, without the else route.
    assert!(
        rendered.contains(&expected(&[
            ("branch", true),
            ("c()", false),
            ("branch", true),
            ("ci()", false),
            ("ti()", false),
            ("stop", false),
        ])),
        "missing standalone inner-enter route: {rendered:?}"
    );
    assert_eq!(paths.len(), 3);
}

#[test]
#[should_panic(expected = "condition block must not contain compound control flow")]
fn compound_control_flow_in_a_condition_panics() {
    let ns = nodes(vec![branch(
        vec![branch(vec![call("inner()")], vec![call("t()")], vec![])],
        vec![call("then()")],
        vec![],
    )]);
    let _ = extract_paths(&ns);
}

#[test]
fn nested_subtree_is_a_schema_violation() {
    let ns = nodes(vec![serde_json::json!({
        "node": "subtree",
        "nodes": [ { "node": "call", "call": "f()" } ]
    })]);
    let err = extract_paths(&ns).expect_err("nested subtree must be rejected");
    assert!(err.contains("subtree"), "unexpected error: {err}");
}
