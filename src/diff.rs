//! Structural diff between two API snapshots
//!
//! Symbols are matched by identity (name, export kind, declaring file,
//! declaring line), never by name alone. Removed/added pairs that are
//! really the same declaration (moved, re-kinded, or renamed) are folded
//! before anything is reported, so downstream rules see the smallest
//! honest change set.

use serde::{Deserialize, Serialize};

use crate::schema::{
    ApiSnapshot, ClassMember, ExportKind, MemberKind, Param, Property, ResolvedExport,
    SymbolKind, SymbolShape, SymbolSnapshot, Visibility,
};

/// One parameter-level change on a function shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ParamChange {
    Added { name: String, required: bool },
    Removed { name: String },
    TypeChanged {
        name: String,
        before: Option<String>,
        after: Option<String>,
    },
    /// optional/defaulted before, required after - arity-breaking
    BecameRequired { name: String },
    /// required before, omittable after - non-breaking widening
    BecameOptional { name: String },
}

/// Field-level delta between two shapes of one symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_changes: Vec<ParamChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type_changed: Option<(Option<String>, Option<String>)>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overloads_changed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_removed: Vec<(String, MemberKind)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_signatures_changed: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties_removed: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties_added: Vec<String>,
    /// optional -> required transitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_types_changed: Vec<(String, Option<String>, Option<String>)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_members_removed: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_members_added: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliased_changed: Option<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type_changed: Option<(Option<String>, Option<String>)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_kind_changed: Option<(ExportKind, ExportKind)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind_changed: Option<(SymbolKind, SymbolKind)>,
}

impl ShapeDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when the delta contains only widenings a caller cannot observe
    /// breaking (optional additions, new members, optionality widening)
    pub fn is_widening_only(&self) -> bool {
        !self.is_empty()
            && self.param_changes.iter().all(|c| {
                matches!(
                    c,
                    ParamChange::BecameOptional { .. }
                        | ParamChange::Added { required: false, .. }
                )
            })
            && self.return_type_changed.is_none()
            && !self.overloads_changed
            && self.members_removed.is_empty()
            && self.member_signatures_changed.is_empty()
            && self.properties_removed.is_empty()
            && self.properties_required.is_empty()
            && self.property_types_changed.is_empty()
            && self.enum_members_removed.is_empty()
            && self.aliased_changed.is_none()
            && self.variable_type_changed.is_none()
            && self.export_kind_changed.is_none()
            && self.kind_changed.is_none()
    }
}

/// A symbol that only exists on one side of the diff
pub type DiffSymbol = ResolvedExport;

/// A symbol present on both sides with a differing shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedSymbol {
    pub before: ResolvedExport,
    pub after: ResolvedExport,
    pub delta: ShapeDelta,
}

/// A removed/added pair folded into a rename
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenamedSymbol {
    pub before: ResolvedExport,
    pub after: ResolvedExport,
}

/// Structural diff between two API snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<DiffSymbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<DiffSymbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modified: Vec<ModifiedSymbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renamed: Vec<RenamedSymbol>,
}

impl ApiDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.renamed.is_empty()
    }
}

/// Shape-equality tolerance used when pairing a removed and an added
/// symbol into a rename.
///
/// The chosen default: parameter lists must match in count, types, and
/// optionality, and return types must match; parameter names are allowed
/// to differ (they are not part of a caller's contract).
#[derive(Debug, Clone, Copy)]
pub struct RenameTolerance {
    pub require_param_names: bool,
    pub require_return_type: bool,
}

impl Default for RenameTolerance {
    fn default() -> Self {
        Self {
            require_param_names: false,
            require_return_type: true,
        }
    }
}

/// Compute the structural diff between two API snapshots
pub fn compute_api_diff(before: &ApiSnapshot, after: &ApiSnapshot) -> ApiDiff {
    compute_api_diff_with(before, after, RenameTolerance::default())
}

pub fn compute_api_diff_with(
    before: &ApiSnapshot,
    after: &ApiSnapshot,
    tolerance: RenameTolerance,
) -> ApiDiff {
    let mut diff = ApiDiff::default();

    // Identity-keyed membership; BTreeMap iteration keeps output canonical
    for (identity, b) in &before.exports {
        match after.exports.get(identity) {
            Some(a) => {
                let delta = shape_delta(b, a);
                if !delta.is_empty() {
                    diff.modified.push(ModifiedSymbol {
                        before: b.clone(),
                        after: a.clone(),
                        delta,
                    });
                }
            }
            None => diff.removed.push(b.clone()),
        }
    }
    for (identity, a) in &after.exports {
        if !before.exports.contains_key(identity) {
            diff.added.push(a.clone());
        }
    }

    fold_same_name_pairs(&mut diff);
    fold_renames(&mut diff, tolerance);

    diff.added.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));
    diff.removed
        .sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));
    diff.modified
        .sort_by(|a, b| a.before.id.to_string().cmp(&b.before.id.to_string()));
    diff.renamed
        .sort_by(|a, b| a.before.id.to_string().cmp(&b.before.id.to_string()));
    diff
}

/// Fold removed/added pairs that share a name and declaring file: the
/// declaration moved, re-kinded, or changed export form rather than being
/// deleted.
fn fold_same_name_pairs(diff: &mut ApiDiff) {
    let mut removed_kept = Vec::new();

    'removed: while let Some(b) = pop_front(&mut diff.removed) {
        for i in 0..diff.added.len() {
            let matches = {
                let a = &diff.added[i];
                a.id.name == b.id.name && a.id.file == b.id.file
            };
            if matches {
                let a = diff.added.remove(i);
                let mut delta = shape_delta(&b, &a);
                if b.id.export_kind != a.id.export_kind {
                    delta.export_kind_changed = Some((b.id.export_kind, a.id.export_kind));
                }
                if !delta.is_empty() {
                    diff.modified.push(ModifiedSymbol {
                        before: b,
                        after: a,
                        delta,
                    });
                }
                // Equal shape and kind at a new line: a pure move, no entry
                continue 'removed;
            }
        }
        removed_kept.push(b);
    }

    diff.removed = removed_kept;
}

/// Pair remaining removed/added entries of the same kind and declaring
/// file whose shapes are equal under the tolerance. Each removed symbol
/// pairs with at most one added symbol; first match in identity order wins.
fn fold_renames(diff: &mut ApiDiff, tolerance: RenameTolerance) {
    let mut removed_kept = Vec::new();

    'removed: while let Some(b) = pop_front(&mut diff.removed) {
        for i in 0..diff.added.len() {
            let candidate = {
                let a = &diff.added[i];
                a.kind == b.kind
                    && a.id.file == b.id.file
                    && shapes_equal_for_rename(&b.shape, &a.shape, tolerance)
            };
            if candidate {
                let a = diff.added.remove(i);
                diff.renamed.push(RenamedSymbol {
                    before: b,
                    after: a,
                });
                continue 'removed;
            }
        }
        removed_kept.push(b);
    }

    diff.removed = removed_kept;
}

fn pop_front<T>(v: &mut Vec<T>) -> Option<T> {
    if v.is_empty() {
        None
    } else {
        Some(v.remove(0))
    }
}

/// Shape equality under rename tolerance
pub fn shapes_equal_for_rename(
    before: &SymbolShape,
    after: &SymbolShape,
    tolerance: RenameTolerance,
) -> bool {
    match (before, after) {
        (
            SymbolShape::Function {
                params: bp,
                return_type: br,
                ..
            },
            SymbolShape::Function {
                params: ap,
                return_type: ar,
                ..
            },
        ) => {
            if bp.len() != ap.len() {
                return false;
            }
            let params_match = bp.iter().zip(ap.iter()).all(|(b, a)| {
                b.ty == a.ty
                    && b.is_omittable() == a.is_omittable()
                    && (!tolerance.require_param_names || b.name == a.name)
            });
            params_match && (!tolerance.require_return_type || br == ar)
        }
        (b, a) => b == a,
    }
}

/// Compute the field-level delta between two resolved exports
fn shape_delta(before: &ResolvedExport, after: &ResolvedExport) -> ShapeDelta {
    let mut delta = ShapeDelta::default();

    if before.kind != after.kind {
        delta.kind_changed = Some((before.kind, after.kind));
        return delta;
    }

    match (&before.shape, &after.shape) {
        (
            SymbolShape::Function {
                params: bp,
                return_type: br,
                overloads: bo,
                ..
            },
            SymbolShape::Function {
                params: ap,
                return_type: ar,
                overloads: ao,
                ..
            },
        ) => {
            delta.param_changes = param_changes(bp, ap);
            if br != ar {
                delta.return_type_changed = Some((br.clone(), ar.clone()));
            }
            if bo != ao {
                delta.overloads_changed = true;
            }
        }
        (SymbolShape::Class { members: bm }, SymbolShape::Class { members: am }) => {
            class_member_delta(&mut delta, bm, am);
        }
        (
            SymbolShape::Interface { properties: bp },
            SymbolShape::Interface { properties: ap },
        ) => {
            property_delta(&mut delta, bp, ap);
        }
        (
            SymbolShape::TypeAlias {
                properties: bp,
                aliased: ba,
            },
            SymbolShape::TypeAlias {
                properties: ap,
                aliased: aa,
            },
        ) => {
            if !bp.is_empty() || !ap.is_empty() {
                property_delta(&mut delta, bp, ap);
            }
            if ba != aa {
                if let (Some(b), Some(a)) = (ba, aa) {
                    delta.aliased_changed = Some((b.clone(), a.clone()));
                } else {
                    delta.aliased_changed = Some((
                        ba.clone().unwrap_or_default(),
                        aa.clone().unwrap_or_default(),
                    ));
                }
            }
        }
        (SymbolShape::Enum { members: bm }, SymbolShape::Enum { members: am }) => {
            delta.enum_members_removed = bm
                .iter()
                .filter(|m| !am.contains(m))
                .cloned()
                .collect();
            delta.enum_members_added = am
                .iter()
                .filter(|m| !bm.contains(m))
                .cloned()
                .collect();
        }
        (SymbolShape::Variable { ty: bt }, SymbolShape::Variable { ty: at }) => {
            if bt != at {
                delta.variable_type_changed = Some((bt.clone(), at.clone()));
            }
        }
        (b, a) => {
            // Differing shape constructors on the same symbol kind only
            // happen across fidelity levels; report nothing rather than
            // invent precision
            if b != a {
                tracing::debug!(
                    symbol = %before.id,
                    "shape constructors differ across fidelity levels, skipping delta"
                );
            }
        }
    }

    delta
}

/// Positional parameter comparison: TS/JS arguments bind by position, so a
/// pure rename at the same position is not a change.
fn param_changes(before: &[Param], after: &[Param]) -> Vec<ParamChange> {
    let mut changes = Vec::new();
    let max = before.len().max(after.len());

    for i in 0..max {
        match (before.get(i), after.get(i)) {
            (Some(b), Some(a)) => {
                if b.ty != a.ty {
                    changes.push(ParamChange::TypeChanged {
                        name: a.name.clone(),
                        before: b.ty.clone(),
                        after: a.ty.clone(),
                    });
                }
                if b.is_omittable() && !a.is_omittable() {
                    changes.push(ParamChange::BecameRequired {
                        name: a.name.clone(),
                    });
                } else if !b.is_omittable() && a.is_omittable() {
                    changes.push(ParamChange::BecameOptional {
                        name: a.name.clone(),
                    });
                }
            }
            (None, Some(a)) => changes.push(ParamChange::Added {
                name: a.name.clone(),
                required: !a.is_omittable(),
            }),
            (Some(b), None) => changes.push(ParamChange::Removed {
                name: b.name.clone(),
            }),
            (None, None) => {}
        }
    }

    changes
}

fn class_member_delta(delta: &mut ShapeDelta, before: &[ClassMember], after: &[ClassMember]) {
    // Private members are not API surface
    let public = |m: &&ClassMember| m.visibility != Visibility::Private;

    for b in before.iter().filter(public) {
        match after.iter().find(|a| a.name == b.name) {
            None => delta.members_removed.push((b.name.clone(), b.kind)),
            Some(a) => {
                if a.visibility == Visibility::Private {
                    delta.members_removed.push((b.name.clone(), b.kind));
                } else if a.signature != b.signature {
                    delta.member_signatures_changed.push(b.name.clone());
                }
            }
        }
    }
    for a in after.iter().filter(public) {
        if !before.iter().any(|b| b.name == a.name) {
            delta.members_added.push(a.name.clone());
        }
    }
}

fn property_delta(delta: &mut ShapeDelta, before: &[Property], after: &[Property]) {
    for b in before {
        match after.iter().find(|a| a.name == b.name) {
            None => delta.properties_removed.push(b.name.clone()),
            Some(a) => {
                if b.optional && !a.optional {
                    delta.properties_required.push(b.name.clone());
                }
                if b.ty != a.ty {
                    delta
                        .property_types_changed
                        .push((b.name.clone(), b.ty.clone(), a.ty.clone()));
                }
            }
        }
    }
    for a in after {
        if !before.iter().any(|b| b.name == a.name) {
            delta.properties_added.push(a.name.clone());
        }
    }
}

// ============================================================================
// Export-only diffing (fallback when no type shapes are available)
// ============================================================================

/// One export whose kind changed between versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportKindChange {
    pub symbol: String,
    pub before_kind: ExportKind,
    pub after_kind: ExportKind,
}

/// Name-keyed export diff: added/removed/kind-changed only, never
/// signature-level modification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportsDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<ExportKindChange>,
}

impl ExportsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Diff two snapshots by exported name only
pub fn compute_exports_diff(before: &SymbolSnapshot, after: &SymbolSnapshot) -> ExportsDiff {
    let before_map = export_kinds(before);
    let after_map = export_kinds(after);
    let mut diff = ExportsDiff::default();

    for (name, kind) in &before_map {
        match after_map.get(name) {
            None => diff.removed.push(name.clone()),
            Some(after_kind) if after_kind != kind => diff.changed.push(ExportKindChange {
                symbol: name.clone(),
                before_kind: *kind,
                after_kind: *after_kind,
            }),
            Some(_) => {}
        }
    }
    for name in after_map.keys() {
        if !before_map.contains_key(name) {
            diff.added.push(name.clone());
        }
    }

    diff.added.sort();
    diff.removed.sort();
    diff.changed.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    diff
}

/// Exported name -> export kind, merging export records with exported
/// declarations (which count as named exports)
fn export_kinds(snapshot: &SymbolSnapshot) -> std::collections::BTreeMap<String, ExportKind> {
    let mut map = std::collections::BTreeMap::new();
    for sym in snapshot.all_symbols().filter(|s| s.is_exported) {
        map.entry(sym.name.clone()).or_insert(ExportKind::Named);
    }
    for record in &snapshot.exports {
        map.insert(record.name.clone(), record.kind);
    }
    map
}
