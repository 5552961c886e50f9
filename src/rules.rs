//! Breaking-change rule catalog and classification
//!
//! Two rule sets exist. The typed set classifies identity-keyed API diffs
//! with full shapes; removals are always `breaking` and additions always
//! `info`. The heuristic set (`JSAPI_` prefix) classifies export-only
//! diffs of untyped sources; it never emits `breaking`, and every message
//! is run through a disclaimer step unless it already hedges or the rule
//! is on the reliable-rule list.

use crate::diff::{ApiDiff, ExportsDiff, ModifiedSymbol, ParamChange, ShapeDelta};
use crate::schema::{
    Finding, ResolvedExport, Severity, SymbolKind, SymbolShape, SymbolSnapshot,
};
use crate::utils::truncate_with_ellipsis;

// Typed rule ids
pub const FN_REMOVED: &str = "FN_REMOVED";
pub const FN_PARAM_REQUIRED: &str = "FN_PARAM_REQUIRED";
pub const FN_PARAM_REMOVED: &str = "FN_PARAM_REMOVED";
pub const FN_PARAM_TYPE_CHANGED: &str = "FN_PARAM_TYPE_CHANGED";
pub const FN_RETURN_TYPE_CHANGED: &str = "FN_RETURN_TYPE_CHANGED";
pub const FN_OVERLOAD_CHANGED: &str = "FN_OVERLOAD_CHANGED";
pub const CLS_REMOVED: &str = "CLS_REMOVED";
pub const CLS_METHOD_REMOVED: &str = "CLS_METHOD_REMOVED";
pub const CLS_PROPERTY_REMOVED: &str = "CLS_PROPERTY_REMOVED";
pub const CLS_METHOD_SIGNATURE_CHANGED: &str = "CLS_METHOD_SIGNATURE_CHANGED";
pub const IFACE_REMOVED: &str = "IFACE_REMOVED";
pub const IFACE_PROPERTY_REMOVED: &str = "IFACE_PROPERTY_REMOVED";
pub const IFACE_PROPERTY_REQUIRED: &str = "IFACE_PROPERTY_REQUIRED";
pub const IFACE_PROPERTY_TYPE_CHANGED: &str = "IFACE_PROPERTY_TYPE_CHANGED";
pub const TYPE_REMOVED: &str = "TYPE_REMOVED";
pub const TYPE_PROPERTY_REQUIRED: &str = "TYPE_PROPERTY_REQUIRED";
pub const TYPE_PROPERTY_TYPE_CHANGED: &str = "TYPE_PROPERTY_TYPE_CHANGED";
pub const TYPE_CHANGED: &str = "TYPE_CHANGED";
pub const ENUM_REMOVED: &str = "ENUM_REMOVED";
pub const ENUM_MEMBER_REMOVED: &str = "ENUM_MEMBER_REMOVED";
pub const EXPORT_REMOVED: &str = "EXPORT_REMOVED";
pub const EXPORT_TYPE_CHANGED: &str = "EXPORT_TYPE_CHANGED";
pub const SYMBOL_ADDED: &str = "SYMBOL_ADDED";
pub const SYMBOL_RENAMED: &str = "SYMBOL_RENAMED";

// Heuristic rule ids (structural-only detections on loosely-typed sources)
pub const JSAPI_EXPORT_REMOVED: &str = "JSAPI_EXPORT_REMOVED";
pub const JSAPI_EXPORT_ADDED: &str = "JSAPI_EXPORT_ADDED";
pub const JSAPI_FN_REMOVED: &str = "JSAPI_FN_REMOVED";
pub const JSAPI_CLASS_REMOVED: &str = "JSAPI_CLASS_REMOVED";
pub const JSAPI_COMPONENT_REMOVED: &str = "JSAPI_COMPONENT_REMOVED";
pub const JSAPI_DEFAULT_EXPORT_CHANGED: &str = "JSAPI_DEFAULT_EXPORT_CHANGED";
pub const JSAPI_EXPORT_KIND_CHANGED: &str = "JSAPI_EXPORT_KIND_CHANGED";
pub const JSAPI_MODULE_SYSTEM_CHANGED: &str = "JSAPI_MODULE_SYSTEM_CHANGED";

/// Disclaimer appended to heuristic findings that do not already hedge
pub const HEURISTIC_SUFFIX: &str = " (JavaScript heuristic - may miss runtime changes)";

/// Heuristic rules considered reliable despite being structural-only:
/// an export line appearing or disappearing is not guesswork
const RELIABLE_HEURISTIC_RULES: &[&str] = &[JSAPI_EXPORT_REMOVED, JSAPI_EXPORT_ADDED];

/// Hedge words that mark a message as already communicating uncertainty
const HEDGE_WORDS: &[&str] = &["likely", "may miss", "possibly", "heuristic"];

const SHAPE_DISPLAY_MAX: usize = 160;

/// Classify a typed API diff into findings.
///
/// Each diff entry yields at most one finding: the most specific
/// applicable rule wins (parameter removal outranks a return-type change
/// on the same function, being the arity-breaking one); ties break by
/// rule id ascending.
pub fn api_diff_to_findings(diff: &ApiDiff) -> Vec<Finding> {
    let mut findings = Vec::new();

    for removed in &diff.removed {
        findings.push(removal_finding(removed));
    }

    for added in &diff.added {
        findings.push(Finding {
            rule: SYMBOL_ADDED.to_string(),
            severity: Severity::Info,
            symbol: added.id.name.clone(),
            file: added.id.file.clone(),
            message: format!(
                "Exported {} '{}' was added.",
                added.kind.label(),
                added.id.name
            ),
            before_shape: None,
            after_shape: Some(shape_display(&added.shape)),
            line: Some(added.id.line),
        });
    }

    for renamed in &diff.renamed {
        findings.push(Finding {
            rule: SYMBOL_RENAMED.to_string(),
            severity: Severity::Breaking,
            symbol: renamed.before.id.name.clone(),
            file: renamed.before.id.file.clone(),
            message: format!(
                "Exported {} '{}' was renamed to '{}'; callers using the old name break.",
                renamed.before.kind.label(),
                renamed.before.id.name,
                renamed.after.id.name
            ),
            before_shape: Some(shape_display(&renamed.before.shape)),
            after_shape: Some(shape_display(&renamed.after.shape)),
            line: Some(renamed.after.id.line),
        });
    }

    for modified in &diff.modified {
        if let Some(finding) = modification_finding(modified) {
            findings.push(finding);
        }
    }

    findings.sort_by(|a, b| {
        (&a.file, &a.symbol, &a.rule).cmp(&(&b.file, &b.symbol, &b.rule))
    });
    findings
}

fn removal_finding(removed: &ResolvedExport) -> Finding {
    let rule = match removed.kind {
        SymbolKind::Function => FN_REMOVED,
        SymbolKind::Class => CLS_REMOVED,
        SymbolKind::Interface => IFACE_REMOVED,
        SymbolKind::TypeAlias => TYPE_REMOVED,
        SymbolKind::Enum => ENUM_REMOVED,
        SymbolKind::Variable => EXPORT_REMOVED,
    };
    Finding {
        rule: rule.to_string(),
        severity: Severity::Breaking,
        symbol: removed.id.name.clone(),
        file: removed.id.file.clone(),
        message: format!(
            "Exported {} '{}' was removed.",
            removed.kind.label(),
            removed.id.name
        ),
        before_shape: Some(shape_display(&removed.shape)),
        after_shape: None,
        line: Some(removed.id.line),
    }
}

/// Candidate rules for one modified entry, in evaluation order
fn modification_finding(modified: &ModifiedSymbol) -> Option<Finding> {
    let delta = &modified.delta;
    let mut candidates: Vec<(u8, &'static str, Severity, String)> = Vec::new();

    if let Some((before_kind, after_kind)) = &delta.export_kind_changed {
        candidates.push((
            0,
            EXPORT_TYPE_CHANGED,
            Severity::Breaking,
            format!(
                "Export '{}' changed from a {} export to a {} export.",
                modified.before.id.name,
                before_kind.label(),
                after_kind.label()
            ),
        ));
    }
    if let Some((before_kind, after_kind)) = &delta.kind_changed {
        candidates.push((
            0,
            EXPORT_TYPE_CHANGED,
            Severity::Breaking,
            format!(
                "Export '{}' changed from a {} to a {}.",
                modified.before.id.name,
                before_kind.label(),
                after_kind.label()
            ),
        ));
    }

    match modified.before.kind {
        SymbolKind::Function => function_rules(modified, delta, &mut candidates),
        SymbolKind::Class => class_rules(modified, delta, &mut candidates),
        SymbolKind::Interface => {
            property_rules(modified, delta, IFACE_PROPERTY_REQUIRED, &mut candidates)
        }
        SymbolKind::TypeAlias => {
            property_rules(modified, delta, TYPE_PROPERTY_REQUIRED, &mut candidates);
            if let Some((before, after)) = &delta.aliased_changed {
                candidates.push((
                    4,
                    TYPE_CHANGED,
                    Severity::Breaking,
                    format!(
                        "Type alias '{}' changed from '{}' to '{}'.",
                        modified.before.id.name,
                        truncate_with_ellipsis(before, SHAPE_DISPLAY_MAX),
                        truncate_with_ellipsis(after, SHAPE_DISPLAY_MAX)
                    ),
                ));
            }
        }
        SymbolKind::Enum => {
            for member in &delta.enum_members_removed {
                candidates.push((
                    1,
                    ENUM_MEMBER_REMOVED,
                    Severity::Breaking,
                    format!(
                        "Enum '{}' member '{}' was removed.",
                        modified.before.id.name, member
                    ),
                ));
            }
        }
        SymbolKind::Variable => {
            if let Some((before, after)) = &delta.variable_type_changed {
                candidates.push((
                    4,
                    TYPE_CHANGED,
                    Severity::Breaking,
                    format!(
                        "Exported variable '{}' changed type from '{}' to '{}'.",
                        modified.before.id.name,
                        before.as_deref().unwrap_or("unknown"),
                        after.as_deref().unwrap_or("unknown")
                    ),
                ));
            }
        }
    }

    // Most specific wins: lowest priority number, then rule id ascending
    candidates.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    let (_, rule, severity, message) = candidates.into_iter().next()?;

    Some(Finding {
        rule: rule.to_string(),
        severity,
        symbol: modified.before.id.name.clone(),
        file: modified.before.id.file.clone(),
        message,
        before_shape: Some(shape_display(&modified.before.shape)),
        after_shape: Some(shape_display(&modified.after.shape)),
        line: Some(modified.after.id.line),
    })
}

fn function_rules(
    modified: &ModifiedSymbol,
    delta: &ShapeDelta,
    candidates: &mut Vec<(u8, &'static str, Severity, String)>,
) {
    let name = &modified.before.id.name;

    for change in &delta.param_changes {
        match change {
            ParamChange::Removed { name: param } => candidates.push((
                1,
                FN_PARAM_REMOVED,
                Severity::Breaking,
                format!("Function '{}' parameter '{}' was removed.", name, param),
            )),
            ParamChange::Added {
                name: param,
                required: true,
            } => candidates.push((
                2,
                FN_PARAM_REQUIRED,
                Severity::Breaking,
                format!(
                    "Function '{}' gained required parameter '{}'.",
                    name, param
                ),
            )),
            ParamChange::BecameRequired { name: param } => candidates.push((
                2,
                FN_PARAM_REQUIRED,
                Severity::Breaking,
                format!(
                    "Function '{}' parameter '{}' is no longer optional.",
                    name, param
                ),
            )),
            ParamChange::TypeChanged {
                name: param,
                before,
                after,
            } => candidates.push((
                3,
                FN_PARAM_TYPE_CHANGED,
                Severity::Breaking,
                format!(
                    "Function '{}' parameter '{}' changed type from '{}' to '{}'.",
                    name,
                    param,
                    before.as_deref().unwrap_or("unknown"),
                    after.as_deref().unwrap_or("unknown")
                ),
            )),
            ParamChange::Added {
                required: false, ..
            }
            | ParamChange::BecameOptional { .. } => {
                // Optional widening is non-breaking by design of the catalog
            }
        }
    }

    if let Some((before, after)) = &delta.return_type_changed {
        candidates.push((
            4,
            FN_RETURN_TYPE_CHANGED,
            Severity::Breaking,
            format!(
                "Function '{}' return type changed from '{}' to '{}'.",
                name,
                before.as_deref().unwrap_or("unknown"),
                after.as_deref().unwrap_or("unknown")
            ),
        ));
    }

    if delta.overloads_changed {
        candidates.push((
            5,
            FN_OVERLOAD_CHANGED,
            Severity::Warning,
            format!("Function '{}' overload set changed.", name),
        ));
    }
}

fn class_rules(
    modified: &ModifiedSymbol,
    delta: &ShapeDelta,
    candidates: &mut Vec<(u8, &'static str, Severity, String)>,
) {
    let name = &modified.before.id.name;

    for (member, kind) in &delta.members_removed {
        let (rule, label) = match kind {
            crate::schema::MemberKind::Property => (CLS_PROPERTY_REMOVED, "property"),
            _ => (CLS_METHOD_REMOVED, "method"),
        };
        candidates.push((
            1,
            rule,
            Severity::Breaking,
            format!("Class '{}' {} '{}' was removed.", name, label, member),
        ));
    }

    for member in &delta.member_signatures_changed {
        candidates.push((
            3,
            CLS_METHOD_SIGNATURE_CHANGED,
            Severity::Breaking,
            format!(
                "Class '{}' method '{}' signature changed.",
                name, member
            ),
        ));
    }
}

fn property_rules(
    modified: &ModifiedSymbol,
    delta: &ShapeDelta,
    required_rule: &'static str,
    candidates: &mut Vec<(u8, &'static str, Severity, String)>,
) {
    let name = &modified.before.id.name;
    let kind_label = modified.before.kind.label();

    for prop in &delta.properties_removed {
        candidates.push((
            1,
            IFACE_PROPERTY_REMOVED,
            Severity::Breaking,
            format!(
                "Property '{}' was removed from {} '{}'.",
                prop, kind_label, name
            ),
        ));
    }

    for prop in &delta.properties_required {
        candidates.push((
            2,
            required_rule,
            Severity::Breaking,
            format!(
                "Property '{}' of {} '{}' is no longer optional.",
                prop, kind_label, name
            ),
        ));
    }

    for (prop, before, after) in &delta.property_types_changed {
        let rule = match modified.before.kind {
            SymbolKind::TypeAlias => TYPE_PROPERTY_TYPE_CHANGED,
            _ => IFACE_PROPERTY_TYPE_CHANGED,
        };
        candidates.push((
            3,
            rule,
            Severity::Breaking,
            format!(
                "Property '{}' of {} '{}' changed type from '{}' to '{}'.",
                prop,
                kind_label,
                name,
                before.as_deref().unwrap_or("unknown"),
                after.as_deref().unwrap_or("unknown")
            ),
        ));
    }
}

fn shape_display(shape: &SymbolShape) -> String {
    truncate_with_ellipsis(&shape.render(), SHAPE_DISPLAY_MAX)
}

// ============================================================================
// Heuristic rule set
// ============================================================================

/// Classify an export-only diff of untyped sources into heuristic
/// findings. Severities never exceed `warning`.
pub fn exports_diff_to_findings(
    diff: &ExportsDiff,
    before: &SymbolSnapshot,
    after: &SymbolSnapshot,
) -> Vec<Finding> {
    let file = before.file.clone();
    let mut findings = Vec::new();
    // Kind-specific rules and the module-system check only make sense for
    // the JavaScript family; other heuristic languages get the generic
    // export rules, which are on the reliable list
    let js_family = matches!(
        before.language.as_str(),
        "javascript" | "jsx" | "typescript" | "tsx"
    );

    for name in &diff.removed {
        let (rule, message) = match before.find_symbol(name).filter(|_| js_family) {
            Some(sym) if is_jsx_component(sym) => (
                JSAPI_COMPONENT_REMOVED,
                format!("Exported component '{}' was removed.", name),
            ),
            Some(sym) if sym.kind == SymbolKind::Function => (
                JSAPI_FN_REMOVED,
                format!("Exported function '{}' was removed.", name),
            ),
            Some(sym) if sym.kind == SymbolKind::Class => (
                JSAPI_CLASS_REMOVED,
                format!("Exported class '{}' was removed.", name),
            ),
            _ => (
                JSAPI_EXPORT_REMOVED,
                format!("Export '{}' was removed.", name),
            ),
        };
        findings.push(heuristic_finding(rule, Severity::Warning, name, &file, message));
    }

    for name in &diff.added {
        findings.push(heuristic_finding(
            JSAPI_EXPORT_ADDED,
            Severity::Info,
            name,
            &file,
            format!("Export '{}' was added.", name),
        ));
    }

    for change in &diff.changed {
        let (rule, message) = if change.symbol == "default" {
            (
                JSAPI_DEFAULT_EXPORT_CHANGED,
                "Default export changed form.".to_string(),
            )
        } else {
            (
                JSAPI_EXPORT_KIND_CHANGED,
                format!(
                    "Export '{}' changed from a {} export to a {} export.",
                    change.symbol,
                    change.before_kind.label(),
                    change.after_kind.label()
                ),
            )
        };
        findings.push(heuristic_finding(
            rule,
            Severity::Warning,
            &change.symbol,
            &file,
            message,
        ));
    }

    // Default export re-bound to a different local symbol kind
    if let Some(message) = default_export_shape_change(before, after).filter(|_| js_family) {
        findings.push(heuristic_finding(
            JSAPI_DEFAULT_EXPORT_CHANGED,
            Severity::Warning,
            "default",
            &file,
            message,
        ));
    }

    if js_family
        && before.module_system != after.module_system
        && before.module_system != crate::schema::ModuleSystem::Unknown
        && after.module_system != crate::schema::ModuleSystem::Unknown
    {
        findings.push(heuristic_finding(
            JSAPI_MODULE_SYSTEM_CHANGED,
            Severity::Warning,
            "*",
            &file,
            "Module system changed; consumers likely need import updates.".to_string(),
        ));
    }

    findings.sort_by(|a, b| {
        (&a.file, &a.symbol, &a.rule).cmp(&(&b.file, &b.symbol, &b.rule))
    });
    findings
}

fn is_jsx_component(sym: &crate::schema::Symbol) -> bool {
    matches!(
        &sym.shape,
        SymbolShape::Function { return_type: Some(rt), .. } if rt == "JSX.Element"
    )
}

/// Compare what the default export points at in both versions
fn default_export_shape_change(
    before: &SymbolSnapshot,
    after: &SymbolSnapshot,
) -> Option<String> {
    let before_local = default_export_kind(before)?;
    let after_local = default_export_kind(after)?;
    if before_local != after_local {
        Some(format!(
            "Default export changed from a {} to a {}.",
            before_local.label(),
            after_local.label()
        ))
    } else {
        None
    }
}

fn default_export_kind(snapshot: &SymbolSnapshot) -> Option<SymbolKind> {
    let record = snapshot
        .exports
        .iter()
        .find(|e| e.kind == crate::schema::ExportKind::Default)?;
    let local = record.local_name.as_ref()?;
    snapshot.find_symbol(local).map(|s| s.kind)
}

fn heuristic_finding(
    rule: &'static str,
    severity: Severity,
    symbol: &str,
    file: &str,
    message: String,
) -> Finding {
    let mut finding = Finding {
        rule: rule.to_string(),
        severity,
        symbol: symbol.to_string(),
        file: file.to_string(),
        message,
        before_shape: None,
        after_shape: None,
        line: None,
    };
    apply_heuristic_disclaimer(&mut finding);
    finding
}

/// Append the uncertainty disclaimer unless the message already hedges or
/// the rule is reliable despite being heuristic
pub fn apply_heuristic_disclaimer(finding: &mut Finding) {
    if RELIABLE_HEURISTIC_RULES.contains(&finding.rule.as_str()) {
        return;
    }
    let lower = finding.message.to_lowercase();
    if HEDGE_WORDS.iter().any(|w| lower.contains(w)) {
        return;
    }
    finding.message.push_str(HEURISTIC_SUFFIX);
}
