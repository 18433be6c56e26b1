use std::path::PathBuf;

use syntry::{EngineError, GrammarRegistry, Language, Query};

fn registry() -> GrammarRegistry {
    GrammarRegistry::with_default_grammars()
}

/// Span fidelity: every node span re-sliced onto the original text
/// reproduces the node text exactly.
#[test]
fn test_span_fidelity_across_languages() -> anyhow::Result<()> {
    let cases = [
        (Language::Python, "p.py", "def f(a):\n    return eval(a)\n"),
        (Language::JavaScript, "j.js", "function f(a) { return a + 1; }\n"),
        (Language::Rust, "r.rs", "fn f(a: u32) -> u32 { a + 1 }\n"),
        (Language::Go, "g.go", "package main\nfunc f(a int) int { return a }\n"),
    ];

    let registry = registry();
    for (language, name, source) in cases {
        let tree = registry.parse(language, &PathBuf::from(name), source)?;
        for node in tree.root().descendants() {
            assert_eq!(node.span().slice(source), node.text(), "{name}: {}", node.kind());
        }
    }
    Ok(())
}

/// Determinism: evaluating the same query twice over the same tree yields
/// the same sequence of capture sets.
#[test]
fn test_evaluation_is_deterministic() -> anyhow::Result<()> {
    let registry = registry();
    let source = "eval(a)\nexec(b)\nfoo.bar(c)\nprint(d)\n";
    let tree = registry.parse(Language::Python, &PathBuf::from("d.py"), source)?;
    let query = Query::compile(
        Language::Python,
        "t",
        r#"(call function: (identifier) @fn (#match? @fn "^(eval|exec)$"))"#,
    )?;

    let run = || -> Vec<(usize, usize, usize)> {
        query
            .evaluate(&tree)
            .map(|caps| {
                let node = caps.get("fn").unwrap();
                (caps.pattern_index(), node.span().start_byte, node.span().end_byte)
            })
            .collect()
    };

    let first = run();
    let second = run();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    Ok(())
}

/// A kind-only pattern produces exactly one capture set per node of that
/// kind: no duplication, no omission.
#[test]
fn test_kind_pattern_counts_nodes_exactly() -> anyhow::Result<()> {
    let registry = registry();
    let source = "a = 1\nb = foo(c, d)\n";
    let tree = registry.parse(Language::Python, &PathBuf::from("k.py"), source)?;
    let query = Query::compile(Language::Python, "t", "(identifier) @id")?;

    let expected: Vec<usize> = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == "identifier")
        .map(|n| n.id())
        .collect();
    let matched: Vec<usize> = query
        .evaluate(&tree)
        .map(|caps| caps.get("id").unwrap().id())
        .collect();

    assert_eq!(matched, expected);
    Ok(())
}

/// Compile-time validation fires before any tree is looked at.
#[test]
fn test_compile_errors_are_eager() {
    let unbound = Query::compile(
        Language::Python,
        "t",
        r#"(call) @c (#eq? @other "eval")"#,
    );
    assert!(matches!(
        unbound,
        Err(EngineError::UnboundCapture { name }) if name == "other"
    ));

    let unknown = Query::compile(
        Language::Python,
        "t",
        r#"(call) @c (#frobnicate? @c "x")"#,
    );
    assert!(matches!(
        unknown,
        Err(EngineError::UnknownPredicate { name }) if name == "frobnicate"
    ));

    let malformed = Query::compile(Language::Python, "t", "(call");
    assert!(matches!(malformed, Err(EngineError::QuerySyntax { .. })));
}

/// Queries are shareable across threads once compiled.
#[test]
fn test_query_shared_across_threads() -> anyhow::Result<()> {
    let registry = registry();
    let query = Query::compile(
        Language::Python,
        "t",
        r#"(call function: (identifier) @fn (#eq? @fn "eval"))"#,
    )?;

    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for i in 0..4 {
            let registry = &registry;
            let query = &query;
            handles.push(scope.spawn(move || {
                let source = "eval(x)\n".repeat(i + 1);
                let tree = registry
                    .parse(Language::Python, &PathBuf::from("t.py"), &source)
                    .unwrap();
                query.evaluate(&tree).count()
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), i + 1);
        }
    });
    Ok(())
}
