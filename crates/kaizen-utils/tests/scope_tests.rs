use kaizen_utils::{ParsedFile, ScopeOptions};
use serde::Serialize;

#[derive(Serialize)]
struct ScopeSummary {
    kind: kaizen_utils::scope::ScopeKind,
    variables: Vec<String>,
    through: Vec<String>,
}

fn summarize(code: &str) -> Vec<ScopeSummary> {
    let file = ParsedFile::with_scope_options("test.js", code, &ScopeOptions::empty());
    let ctx = file.context();
    let scopes = file.scopes();
    scopes
        .scopes()
        .map(|scope| ScopeSummary {
            kind: scope.kind,
            variables: scope
                .variables
                .iter()
                .map(|&v| scopes.variable(v).name.clone())
                .collect(),
            through: scope
                .through
                .iter()
                .map(|&r| ctx.node_text(scopes.reference(r).identifier).to_string())
                .collect(),
        })
        .collect()
}

#[test]
fn nested_function_scopes() {
    let summary = summarize(
        "const a = 1;\nfunction f(b) {\n  let c = a + b;\n  return missing;\n}",
    );

    insta::assert_json_snapshot!(summary, @r#"
    [
      {
        "kind": "global",
        "variables": [],
        "through": [
          "missing"
        ]
      },
      {
        "kind": "module",
        "variables": [
          "a",
          "f"
        ],
        "through": [
          "missing"
        ]
      },
      {
        "kind": "function",
        "variables": [
          "arguments",
          "b",
          "c"
        ],
        "through": [
          "a",
          "missing"
        ]
      }
    ]
    "#);
}

#[test]
fn declared_globals_resolve_references() {
    let options = ScopeOptions::empty().with_globals(["console"]);
    let file = ParsedFile::with_scope_options("test.js", "console.log(x);", &options);
    let scopes = file.scopes();
    let global = scopes.get(scopes.global_scope());

    let console = scopes
        .variables()
        .find(|v| v.name == "console")
        .expect("declared global");
    assert_eq!(console.defs.len(), 0);
    assert_eq!(console.references.len(), 1);

    let through: Vec<_> = global
        .through
        .iter()
        .map(|&r| file.context().node_text(scopes.reference(r).identifier).to_string())
        .collect();
    assert_eq!(through, vec!["x"]);
}

#[test]
fn declarator_init_is_a_write_reference() {
    let file = ParsedFile::with_scope_options("test.js", "let a = 1; a;", &ScopeOptions::empty());
    let scopes = file.scopes();
    let a = scopes.variables().find(|v| v.name == "a").expect("declared");
    let refs: Vec<_> = scopes.references_of(a.id).collect();

    assert_eq!(refs.len(), 2);
    assert!(refs[0].is_write_only());
    assert!(refs[0].init);
    assert!(refs[1].is_read_only());
}

#[test]
fn arrow_functions_have_no_arguments_binding() {
    let file =
        ParsedFile::with_scope_options("test.js", "const f = (x) => x;", &ScopeOptions::empty());
    let names: Vec<_> = file.scopes().variables().map(|v| v.name.as_str()).collect();

    assert_eq!(names, vec!["f", "x"]);
}
