//! Analysis result assembly and rendering
//!
//! Outputs are compared byte-for-byte against golden fixtures, so every
//! collection is sorted, deduplicated, and free of timestamps or random
//! identifiers.

use serde::{Deserialize, Serialize};

use crate::schema::{Finding, Severity, UsageMatch};

/// Aggregated findings plus the sorted index lists consumers key on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub rule_ids: Vec<String>,
    pub symbol_names: Vec<String>,
    pub severities: Vec<String>,
    pub file_paths: Vec<String>,
}

impl AnalysisResult {
    /// Assemble the canonical result: findings sorted by (file, symbol),
    /// index lists sorted ascending and deduplicated
    pub fn from_findings(mut findings: Vec<Finding>) -> Self {
        findings.sort_by(|a, b| {
            (&a.file, &a.symbol, &a.rule).cmp(&(&b.file, &b.symbol, &b.rule))
        });

        let mut rule_ids: Vec<String> = findings.iter().map(|f| f.rule.clone()).collect();
        let mut symbol_names: Vec<String> = findings.iter().map(|f| f.symbol.clone()).collect();
        let mut severities: Vec<String> = findings
            .iter()
            .map(|f| f.severity.label().to_string())
            .collect();
        let mut file_paths: Vec<String> = findings.iter().map(|f| f.file.clone()).collect();
        for list in [
            &mut rule_ids,
            &mut symbol_names,
            &mut severities,
            &mut file_paths,
        ] {
            list.sort();
            list.dedup();
        }

        Self {
            findings,
            rule_ids,
            symbol_names,
            severities,
            file_paths,
        }
    }

    pub fn has_breaking(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Breaking)
    }

    /// Human-readable rendering for terminal consumption
    pub fn render_text(&self) -> String {
        if self.findings.is_empty() {
            return "No API changes detected.\n".to_string();
        }

        let mut out = String::new();
        for finding in &self.findings {
            out.push_str(&format!(
                "[{}] {} {}: {}\n",
                finding.severity.label(),
                finding.rule,
                finding.file,
                finding.message
            ));
            if let Some(before) = &finding.before_shape {
                out.push_str(&format!("    before: {}\n", before));
            }
            if let Some(after) = &finding.after_shape {
                out.push_str(&format!("    after:  {}\n", after));
            }
        }

        let breaking = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Breaking)
            .count();
        out.push_str(&format!(
            "\n{} finding(s), {} breaking\n",
            self.findings.len(),
            breaking
        ));
        out
    }
}

/// Impacted-file report produced by the usage matcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub matches: Vec<UsageMatch>,
    pub impacted_files: Vec<String>,
}

impl UsageReport {
    pub fn from_matches(mut matches: Vec<UsageMatch>) -> Self {
        matches.sort_by(|a, b| a.file.cmp(&b.file));
        let mut impacted_files: Vec<String> =
            matches.iter().map(|m| m.file.clone()).collect();
        impacted_files.sort();
        impacted_files.dedup();
        Self {
            matches,
            impacted_files,
        }
    }

    pub fn render_text(&self) -> String {
        if self.matches.is_empty() {
            return "No impacted files.\n".to_string();
        }
        let mut out = String::new();
        for m in &self.matches {
            let confidence = match m.confidence {
                crate::schema::MatchConfidence::AstVerified => "ast",
                crate::schema::MatchConfidence::Heuristic => "heuristic",
            };
            if m.symbols.is_empty() {
                out.push_str(&format!("{} ({})\n", m.file, confidence));
            } else {
                out.push_str(&format!(
                    "{} ({}): {}\n",
                    m.file,
                    confidence,
                    m.symbols.join(", ")
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MatchConfidence;

    fn finding(file: &str, symbol: &str, rule: &str, severity: Severity) -> Finding {
        Finding {
            rule: rule.to_string(),
            severity,
            symbol: symbol.to_string(),
            file: file.to_string(),
            message: format!("{} changed", symbol),
            before_shape: None,
            after_shape: None,
            line: None,
        }
    }

    #[test]
    fn test_findings_sorted_by_file_then_symbol() {
        let result = AnalysisResult::from_findings(vec![
            finding("b.ts", "zeta", "FN_REMOVED", Severity::Breaking),
            finding("a.ts", "beta", "FN_REMOVED", Severity::Breaking),
            finding("a.ts", "alpha", "SYMBOL_ADDED", Severity::Info),
        ]);
        let order: Vec<(&str, &str)> = result
            .findings
            .iter()
            .map(|f| (f.file.as_str(), f.symbol.as_str()))
            .collect();
        assert_eq!(order, vec![("a.ts", "alpha"), ("a.ts", "beta"), ("b.ts", "zeta")]);
    }

    #[test]
    fn test_index_lists_sorted_unique() {
        let result = AnalysisResult::from_findings(vec![
            finding("a.ts", "x", "FN_REMOVED", Severity::Breaking),
            finding("a.ts", "y", "FN_REMOVED", Severity::Breaking),
        ]);
        assert_eq!(result.rule_ids, vec!["FN_REMOVED"]);
        assert_eq!(result.file_paths, vec!["a.ts"]);
        assert_eq!(result.severities, vec!["breaking"]);
        assert_eq!(result.symbol_names, vec!["x", "y"]);
    }

    #[test]
    fn test_deterministic_serialization() {
        let build = || {
            AnalysisResult::from_findings(vec![
                finding("b.ts", "b", "CLS_REMOVED", Severity::Breaking),
                finding("a.ts", "a", "SYMBOL_ADDED", Severity::Info),
            ])
        };
        let first = serde_json::to_string(&build()).unwrap();
        let second = serde_json::to_string(&build()).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("ruleIds"));
        assert!(first.contains("filePaths"));
    }

    #[test]
    fn test_usage_report_sorted() {
        let report = UsageReport::from_matches(vec![
            UsageMatch {
                file: "z.test.ts".to_string(),
                symbols: vec!["a".to_string()],
                confidence: MatchConfidence::AstVerified,
            },
            UsageMatch {
                file: "a.test.ts".to_string(),
                symbols: vec!["a".to_string()],
                confidence: MatchConfidence::Heuristic,
            },
        ]);
        assert_eq!(report.impacted_files, vec!["a.test.ts", "z.test.ts"]);
    }

    #[test]
    fn test_render_text_mentions_breaking_count() {
        let result = AnalysisResult::from_findings(vec![finding(
            "a.ts",
            "x",
            "FN_REMOVED",
            Severity::Breaking,
        )]);
        let text = result.render_text();
        assert!(text.contains("[breaking] FN_REMOVED"));
        assert!(text.contains("1 breaking"));
    }
}
