//! End-to-end pipeline tests: snapshot -> diff -> findings
//!
//! These exercise the full chain over real files on disk, the way the CLI
//! drives it.

mod common;

use apidrift::analyzers::AnalyzerCache;
use apidrift::schema::{AnalysisMode, Severity};
use apidrift::{api_diff_to_findings, build_api_snapshot, compute_api_diff};
use common::TestTree;

fn snapshot(tree: &TestTree, entry: &str) -> apidrift::ApiSnapshot {
    let mut cache = AnalyzerCache::new(tree.root());
    build_api_snapshot(
        &tree.path(entry),
        &mut cache,
        None,
        AnalysisMode::ApiSnapshot,
    )
    .expect("analysis succeeds")
    .expect("entrypoint exists")
}

#[test]
fn snapshot_is_idempotent() {
    let tree = TestTree::new(&[(
        "api.ts",
        "export function add(a: number, b: number): number { return a + b; }\n\
         export interface Options { depth?: number; }\n",
    )]);
    let first = snapshot(&tree, "api.ts");
    let second = snapshot(&tree, "api.ts");
    assert_eq!(first, second);
}

#[test]
fn self_diff_is_empty() {
    let tree = TestTree::new(&[(
        "api.ts",
        "export class Store { get(key: string): string { return key; } }\n\
         export enum Level { Low, High }\n",
    )]);
    let snap = snapshot(&tree, "api.ts");
    let diff = compute_api_diff(&snap, &snap);
    assert!(diff.is_empty());
    assert!(api_diff_to_findings(&diff).is_empty());
}

#[test]
fn removed_function_is_breaking() {
    let tree = TestTree::new(&[
        (
            "before/api.ts",
            "export function keep(): void {}\nexport function gone(x: number): void {}\n",
        ),
        ("after/api.ts", "export function keep(): void {}\n"),
    ]);
    let before = snapshot(&tree, "before/api.ts");
    let after = snapshot(&tree, "after/api.ts");

    // Same module in two tree versions: align the declaring-file identity
    let before = realign(before, "api.ts");
    let after = realign(after, "api.ts");

    let diff = compute_api_diff(&before, &after);
    assert_eq!(diff.removed.len(), 1);

    let findings = api_diff_to_findings(&diff);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule, "FN_REMOVED");
    assert_eq!(findings[0].severity, Severity::Breaking);
    assert_eq!(findings[0].symbol, "gone");
}

#[test]
fn default_value_gain_is_not_breaking() {
    let tree = TestTree::new(&[
        (
            "before/api.ts",
            "export function greet(name: string): string { return name; }\n",
        ),
        (
            "after/api.ts",
            "export function greet(name: string = \"world\"): string { return name; }\n",
        ),
    ]);
    let before = realign(snapshot(&tree, "before/api.ts"), "api.ts");
    let after = realign(snapshot(&tree, "after/api.ts"), "api.ts");

    let findings = api_diff_to_findings(&compute_api_diff(&before, &after));
    assert!(
        findings.iter().all(|f| f.severity != Severity::Breaking),
        "optional widening must not be breaking: {:?}",
        findings
    );
}

#[test]
fn required_param_gain_is_breaking() {
    let tree = TestTree::new(&[
        (
            "before/api.ts",
            "export function add(a: number, b: number): number { return a + b; }\n",
        ),
        (
            "after/api.ts",
            "export function add(a: number, b: number, c: number): number { return a + b + c; }\n",
        ),
    ]);
    let before = realign(snapshot(&tree, "before/api.ts"), "api.ts");
    let after = realign(snapshot(&tree, "after/api.ts"), "api.ts");

    let findings = api_diff_to_findings(&compute_api_diff(&before, &after));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule, "FN_PARAM_REQUIRED");
    assert_eq!(findings[0].severity, Severity::Breaking);
    assert_eq!(findings[0].symbol, "add");
}

#[test]
fn barrel_chain_resolves_through_two_hops() {
    let tree = TestTree::new(&[
        (
            "core/impl.ts",
            "export function deep(value: string): string { return value; }\n",
        ),
        ("core/index.ts", "export { deep } from \"./impl\";\n"),
        ("index.ts", "export { deep } from \"./core\";\n"),
    ]);
    let snap = snapshot(&tree, "index.ts");
    assert!(!snap.partial);

    let export = snap.exports.values().find(|e| e.id.name == "deep").unwrap();
    assert!(
        export.id.file.ends_with("impl.ts"),
        "identity must point at the declaring file, got {}",
        export.id.file
    );
}

#[test]
fn interface_optional_to_required_is_breaking() {
    let tree = TestTree::new(&[
        (
            "before/api.ts",
            "export interface Options { root: string; depth?: number; }\n",
        ),
        (
            "after/api.ts",
            "export interface Options { root: string; depth: number; }\n",
        ),
    ]);
    let before = realign(snapshot(&tree, "before/api.ts"), "api.ts");
    let after = realign(snapshot(&tree, "after/api.ts"), "api.ts");

    let findings = api_diff_to_findings(&compute_api_diff(&before, &after));
    assert_eq!(findings[0].rule, "IFACE_PROPERTY_REQUIRED");
    assert_eq!(findings[0].severity, Severity::Breaking);
}

#[test]
fn rename_is_paired_not_double_counted() {
    let tree = TestTree::new(&[
        (
            "before/api.ts",
            "export function fetchUser(id: string): string { return id; }\n",
        ),
        (
            "after/api.ts",
            "export function loadUser(id: string): string { return id; }\n",
        ),
    ]);
    let before = realign(snapshot(&tree, "before/api.ts"), "api.ts");
    let after = realign(snapshot(&tree, "after/api.ts"), "api.ts");

    let diff = compute_api_diff(&before, &after);
    assert!(diff.removed.is_empty());
    assert!(diff.added.is_empty());
    assert_eq!(diff.renamed.len(), 1);

    let findings = api_diff_to_findings(&diff);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule, "SYMBOL_RENAMED");
}

/// Rewrite identity file paths so two parallel tree versions of the same
/// module compare as one
fn realign(api: apidrift::ApiSnapshot, label: &str) -> apidrift::ApiSnapshot {
    let mut out = apidrift::ApiSnapshot::new(label, api.analysis_mode);
    out.partial = api.partial;
    out.failed_shapes = api.failed_shapes;
    out.failed_shape_names = api.failed_shape_names.clone();
    out.module_system = api.module_system;
    for export in api.exports.into_values() {
        let mut id = export.id;
        id.file = label.to_string();
        out.exports.insert(
            id.to_string(),
            apidrift::schema::ResolvedExport {
                id,
                kind: export.kind,
                shape: export.shape,
            },
        );
    }
    out
}
