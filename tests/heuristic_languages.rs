//! Heuristic analyzer integration: Python/Ruby scanning and the
//! export-level diff fallback driven through the command layer

mod common;

use apidrift::cli::OutputFormat;
use apidrift::commands::{run_diff, run_exports_diff};
use apidrift::schema::AnalysisMode;
use apidrift::AnalysisResult;
use common::TestTree;

#[test]
fn python_export_removal_is_warning_not_breaking() {
    let tree = TestTree::new(&[
        (
            "before.py",
            "def kept():\n    pass\n\ndef dropped():\n    pass\n",
        ),
        ("after.py", "def kept():\n    pass\n"),
    ]);

    let out = run_diff(
        &tree.path("before.py"),
        &tree.path("after.py"),
        AnalysisMode::ApiSnapshot,
        None,
        OutputFormat::Json,
    )
    .unwrap();
    let result: AnalysisResult = serde_json::from_str(&out).unwrap();

    assert_eq!(result.symbol_names, vec!["dropped"]);
    assert_eq!(result.severities, vec!["warning"]);
    // Generic export rule for non-JS heuristic sources: reliable, so no
    // JavaScript disclaimer
    assert_eq!(result.rule_ids, vec!["JSAPI_EXPORT_REMOVED"]);
    assert!(!result.findings[0].message.contains("JavaScript heuristic"));
}

#[test]
fn python_private_function_removal_is_silent() {
    let tree = TestTree::new(&[
        (
            "before.py",
            "def api():\n    pass\n\ndef _internal():\n    pass\n",
        ),
        ("after.py", "def api():\n    pass\n"),
    ]);

    let out = run_diff(
        &tree.path("before.py"),
        &tree.path("after.py"),
        AnalysisMode::ApiSnapshot,
        None,
        OutputFormat::Json,
    )
    .unwrap();
    let result: AnalysisResult = serde_json::from_str(&out).unwrap();
    assert!(result.findings.is_empty(), "{:?}", result.findings);
}

#[test]
fn ruby_class_removal_detected() {
    let tree = TestTree::new(&[
        (
            "before.rb",
            "class Cart\n  def add(item)\n  end\nend\n\nclass Order\n  def total\n  end\nend\n",
        ),
        ("after.rb", "class Cart\n  def add(item)\n  end\nend\n"),
    ]);

    let out = run_diff(
        &tree.path("before.rb"),
        &tree.path("after.rb"),
        AnalysisMode::ApiSnapshot,
        None,
        OutputFormat::Json,
    )
    .unwrap();
    let result: AnalysisResult = serde_json::from_str(&out).unwrap();
    assert_eq!(result.symbol_names, vec!["Order"]);
    assert_eq!(result.severities, vec!["warning"]);
}

#[test]
fn js_heuristic_findings_carry_disclaimer() {
    let tree = TestTree::new(&[
        (
            "before.js",
            "export function foo() {}\nexport function bar() {}\n",
        ),
        ("after.js", "export function bar() {}\n"),
    ]);

    let out = run_diff(
        &tree.path("before.js"),
        &tree.path("after.js"),
        AnalysisMode::ApiSnapshot,
        None,
        OutputFormat::Json,
    )
    .unwrap();
    let result: AnalysisResult = serde_json::from_str(&out).unwrap();

    assert_eq!(result.rule_ids, vec!["JSAPI_FN_REMOVED"]);
    let message = &result.findings[0].message;
    assert!(message.starts_with("Exported function 'foo' was removed."));
    assert!(message.ends_with("(JavaScript heuristic - may miss runtime changes)"));
}

#[test]
fn jsx_component_removal_rule() {
    let tree = TestTree::new(&[
        (
            "before.jsx",
            "export function Button(props) { return <button>{props.label}</button>; }\n\
             export function helper() { return 1; }\n",
        ),
        (
            "after.jsx",
            "export function helper() { return 1; }\n",
        ),
    ]);

    let out = run_diff(
        &tree.path("before.jsx"),
        &tree.path("after.jsx"),
        AnalysisMode::ApiSnapshot,
        None,
        OutputFormat::Json,
    )
    .unwrap();
    let result: AnalysisResult = serde_json::from_str(&out).unwrap();
    assert_eq!(result.rule_ids, vec!["JSAPI_COMPONENT_REMOVED"]);
}

#[test]
fn exports_diff_lists_are_sorted() {
    let tree = TestTree::new(&[
        (
            "before.js",
            "export function zeta() {}\nexport function alpha() {}\nexport function mid() {}\n",
        ),
        ("after.js", "export function mid() {}\n"),
    ]);

    let out = run_exports_diff(
        &tree.path("before.js"),
        &tree.path("after.js"),
        OutputFormat::Json,
    )
    .unwrap();
    let diff: apidrift::ExportsDiff = serde_json::from_str(&out).unwrap();
    assert_eq!(diff.removed, vec!["alpha", "zeta"]);
}

#[test]
fn tree_diff_mixes_languages() {
    let tree = TestTree::new(&[
        (
            "before/src/api.ts",
            "export function typedGone(a: number): void {}\n",
        ),
        ("before/lib/tool.py", "def py_gone():\n    pass\n"),
        ("after/src/api.ts", "export function added(): void {}\n"),
        ("after/lib/tool.py", "def replacement():\n    pass\n"),
    ]);

    let out = run_diff(
        &tree.path("before"),
        &tree.path("after"),
        AnalysisMode::ApiSnapshot,
        None,
        OutputFormat::Json,
    )
    .unwrap();
    let result: AnalysisResult = serde_json::from_str(&out).unwrap();

    // Typed rule for the TS file, heuristic rules for the Python file
    assert!(result.rule_ids.contains(&"FN_REMOVED".to_string()));
    assert!(result.rule_ids.contains(&"JSAPI_EXPORT_REMOVED".to_string()));
    assert!(result.severities.contains(&"breaking".to_string()));
    assert!(result.severities.contains(&"warning".to_string()));
    // Deterministic: findings sorted by (file, symbol)
    let mut sorted = result.findings.clone();
    sorted.sort_by(|a, b| (&a.file, &a.symbol).cmp(&(&b.file, &b.symbol)));
    assert_eq!(result.findings, sorted);
}
