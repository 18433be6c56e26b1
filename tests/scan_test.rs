use std::path::PathBuf;

use syntry::{
    catalog, scan_corpus, scan_file, GrammarRegistry, Language, Query, SourceFile,
};

/// End-to-end: exception handler with no type name. One bare handler and
/// one typed handler yield exactly one finding, spanning the bare one.
#[test]
fn test_bare_exception_handler_scenario() -> anyhow::Result<()> {
    let source = "\
try:
    risky()
except ValueError:
    handle()
try:
    risky()
except:
    pass
";
    let registry = GrammarRegistry::with_default_grammars();
    let query = Query::compile(
        Language::Python,
        "quality.bare_except",
        r#"(except_clause) @quality.bare_except
(#not-has-child? @quality.bare_except "identifier")"#,
    )?;

    let file = SourceFile::new(Language::Python, "app.py", source);
    let outcome = scan_file(&registry, &[query], &file);

    assert_eq!(outcome.findings.len(), 1);
    let finding = &outcome.findings[0];
    assert_eq!(finding.category, "quality.bare_except");
    assert_eq!(finding.span.start_line, 7);
    assert!(finding.bound_text.starts_with("except:"));
    assert!(outcome.diagnostics.is_empty());
    Ok(())
}

/// End-to-end: eval/exec detection. Calls to eval and exec are reported,
/// print is not.
#[test]
fn test_eval_exec_scenario() -> anyhow::Result<()> {
    let source = "eval(x)\nexec(y)\nprint(z)\n";
    let registry = GrammarRegistry::with_default_grammars();
    let query = Query::compile(
        Language::Python,
        "security.eval_exec",
        r#"(call
  function: (identifier) @security.eval_exec
  (#match? @security.eval_exec "^(eval|exec)$"))"#,
    )?
    .with_primary_capture("security.eval_exec")?;

    let file = SourceFile::new(Language::Python, "app.py", source);
    let outcome = scan_file(&registry, &[query], &file);

    let texts: Vec<_> = outcome
        .findings
        .iter()
        .map(|f| f.bound_text.as_str())
        .collect();
    assert_eq!(texts, vec!["eval", "exec"]);
    for finding in &outcome.findings {
        assert_eq!(finding.capture_name, "security.eval_exec");
        assert_eq!(finding.file, PathBuf::from("app.py"));
    }
    Ok(())
}

/// End-to-end: one failing file contributes zero findings plus one
/// diagnostic, and does not stop other files from producing findings.
#[test]
fn test_failing_file_is_isolated() -> anyhow::Result<()> {
    let registry = GrammarRegistry::with_default_grammars();
    let query = Query::compile(
        Language::Python,
        "security.eval_exec",
        r#"(call function: (identifier) @fn (#eq? @fn "eval"))"#,
    )?;

    let files = vec![
        SourceFile::new(Language::Other, "blob.bin", "\u{0}\u{1}\u{2}"),
        SourceFile::new(Language::Python, "good.py", "eval(x)\n"),
    ];

    let outcome = scan_corpus(&registry, &[query], &files);

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].file, PathBuf::from("good.py"));
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].file, PathBuf::from("blob.bin"));
    Ok(())
}

/// A degraded parse still yields findings from the recovered part of the
/// tree, with a diagnostic alongside them.
#[test]
fn test_degraded_parse_yields_findings_and_diagnostic() -> anyhow::Result<()> {
    let source = "eval(x)\ndef broken(:\n";
    let registry = GrammarRegistry::with_default_grammars();
    let query = Query::compile(
        Language::Python,
        "security.eval_exec",
        r#"(call function: (identifier) @fn (#eq? @fn "eval"))"#,
    )?;

    let file = SourceFile::new(Language::Python, "partial.py", source);
    let outcome = scan_file(&registry, &[query], &file);

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("recovered"));
    Ok(())
}

/// Queries only run against files of their own language.
#[test]
fn test_queries_filtered_by_language() -> anyhow::Result<()> {
    let registry = GrammarRegistry::with_default_grammars();
    let python = Query::compile(
        Language::Python,
        "security.eval_exec",
        r#"(call function: (identifier) @fn (#eq? @fn "eval"))"#,
    )?;
    let javascript = Query::compile(
        Language::JavaScript,
        "security.eval",
        r#"(call_expression function: (identifier) @fn (#eq? @fn "eval"))"#,
    )?;

    let files = vec![
        SourceFile::detect("a.py", "eval(x)\n"),
        SourceFile::detect("b.js", "eval(y);\n"),
    ];

    let outcome = scan_corpus(&registry, &[python, javascript], &files);

    assert_eq!(outcome.findings.len(), 2);
    let categories: Vec<_> = outcome
        .findings
        .iter()
        .map(|f| (f.file.clone(), f.category.clone()))
        .collect();
    assert!(categories.contains(&(PathBuf::from("a.py"), "security.eval_exec".to_string())));
    assert!(categories.contains(&(PathBuf::from("b.js"), "security.eval".to_string())));
    Ok(())
}

/// The bundled catalog runs end to end over a small mixed corpus.
#[test]
fn test_catalog_over_mixed_corpus() -> anyhow::Result<()> {
    let registry = GrammarRegistry::with_default_grammars();
    let queries = catalog::default_queries()?;

    let files = vec![
        SourceFile::detect(
            "app.py",
            "password = \"hunter2\"\ntry:\n    eval(data)\nexcept:\n    pass\n",
        ),
        SourceFile::detect("ui.js", "panel.innerHTML = data;\n"),
    ];

    let outcome = scan_corpus(&registry, &queries, &files);

    let mut categories: Vec<_> = outcome
        .findings
        .iter()
        .map(|f| f.category.as_str())
        .collect();
    categories.sort_unstable();
    assert_eq!(
        categories,
        vec![
            "quality.bare_except",
            "security.eval_exec",
            "security.hardcoded_secret",
            "security.inner_html",
        ]
    );
    Ok(())
}

/// Findings serialize to JSON for the downstream aggregator.
#[test]
fn test_findings_serialize_to_json() -> anyhow::Result<()> {
    let registry = GrammarRegistry::with_default_grammars();
    let query = Query::compile(
        Language::Python,
        "security.eval_exec",
        r#"(call function: (identifier) @fn (#eq? @fn "eval"))"#,
    )?
    .with_tags(["security"]);

    let file = SourceFile::new(Language::Python, "app.py", "eval(x)\n");
    let outcome = scan_file(&registry, &[query], &file);

    let json = serde_json::to_value(&outcome)?;
    let findings = json["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["category"], "security.eval_exec");
    assert_eq!(findings[0]["tags"][0], "security");
    Ok(())
}

/// Files read from disk scan the same as in-memory sources; the language
/// is detected from the on-disk file name.
#[test]
fn test_scan_files_read_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("app.py");
    std::fs::write(&path, "eval(payload)\n")?;

    let registry = GrammarRegistry::with_default_grammars();
    let query = Query::compile(
        Language::Python,
        "security.eval_exec",
        r#"(call function: (identifier) @fn (#eq? @fn "eval"))"#,
    )?;

    let text = std::fs::read_to_string(&path)?;
    let file = SourceFile::detect(&path, text);
    assert_eq!(file.language, Language::Python);

    let outcome = scan_file(&registry, &[query], &file);
    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].file, path);
    Ok(())
}
