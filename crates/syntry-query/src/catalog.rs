//! Ready-made queries for common scrub categories.
//!
//! These cover the categories the downstream collectors consume most:
//! dynamic evaluation, bare exception handlers, hardcoded secrets and
//! shelling out. Callers can compile them all with [`default_queries`] or
//! pick individual pattern texts.

use syntry_core::{EngineError, Language};

use crate::query::Query;

/// Python: eval/exec calls.
pub const PYTHON_EVAL_EXEC: &str = r#"
(call
  function: (identifier) @security.eval_exec
  (#match? @security.eval_exec "^(eval|exec)$"))
"#;

/// Python: exception handlers with no type name.
pub const PYTHON_BARE_EXCEPT: &str = r#"
(except_clause) @quality.bare_except
(#not-has-child? @quality.bare_except "identifier")
(#not-has-child? @quality.bare_except "tuple")
(#not-has-child? @quality.bare_except "attribute")
(#not-has-child? @quality.bare_except "as_pattern")
"#;

/// Python: string literal assigned to a secret-looking variable name.
pub const PYTHON_HARDCODED_SECRET: &str = r#"
(assignment
  left: (identifier) @security.secret.name
  right: (string) @security.secret.value
  (#match? @security.secret.name "(?i)(password|passwd|secret|token|api_?key)"))
"#;

/// Python: subprocess helpers invoked with shell=True.
pub const PYTHON_SUBPROCESS_SHELL: &str = r#"
(call
  function: (attribute
    object: (identifier) @security.shell.module
    attribute: (identifier) @security.shell.method)
  arguments: (argument_list
    (keyword_argument
      name: (identifier) @security.shell.kwarg
      value: (true)))
  (#eq? @security.shell.module "subprocess")
  (#match? @security.shell.method "^(run|call|Popen|check_output|check_call)$")
  (#eq? @security.shell.kwarg "shell"))
"#;

/// JavaScript: eval calls.
pub const JS_EVAL: &str = r#"
(call_expression
  function: (identifier) @security.eval
  (#eq? @security.eval "eval"))
"#;

/// JavaScript: innerHTML assignments.
pub const JS_INNER_HTML: &str = r#"
(assignment_expression
  left: (member_expression
    property: (property_identifier) @security.inner_html)
  (#eq? @security.inner_html "innerHTML"))
"#;

/// Rust: unwrap/expect calls.
pub const RUST_UNWRAP: &str = r#"
(call_expression
  function: (field_expression
    field: (field_identifier) @quality.unwrap)
  (#match? @quality.unwrap "^(unwrap|expect)$"))
"#;

/// C: string functions with no bounds checking.
pub const C_UNSAFE_STRING_FN: &str = r#"
(call_expression
  function: (identifier) @security.c_string_fn
  (#any-of? @security.c_string_fn "strcpy" "sprintf" "gets"))
"#;

/// Compile the full bundled catalog.
pub fn default_queries() -> Result<Vec<Query>, EngineError> {
    let entries: &[(Language, &str, &str, &[&str])] = &[
        (
            Language::Python,
            "security.eval_exec",
            PYTHON_EVAL_EXEC,
            &["security", "dynamic-eval"],
        ),
        (
            Language::Python,
            "quality.bare_except",
            PYTHON_BARE_EXCEPT,
            &["quality", "error-handling"],
        ),
        (
            Language::Python,
            "security.hardcoded_secret",
            PYTHON_HARDCODED_SECRET,
            &["security", "secrets"],
        ),
        (
            Language::Python,
            "security.subprocess_shell",
            PYTHON_SUBPROCESS_SHELL,
            &["security", "command-injection"],
        ),
        (
            Language::JavaScript,
            "security.eval",
            JS_EVAL,
            &["security", "dynamic-eval"],
        ),
        (
            Language::JavaScript,
            "security.inner_html",
            JS_INNER_HTML,
            &["security", "xss"],
        ),
        (
            Language::Rust,
            "quality.unwrap",
            RUST_UNWRAP,
            &["quality", "error-handling"],
        ),
        (
            Language::C,
            "security.c_string_fn",
            C_UNSAFE_STRING_FN,
            &["security", "memory-safety"],
        ),
    ];

    entries
        .iter()
        .map(|(language, category, pattern, tags)| {
            Ok(Query::compile(*language, category, pattern)?.with_tags(tags.iter().copied()))
        })
        .collect()
}
