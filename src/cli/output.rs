//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::constraints::{DeploymentConflictReport, MissingDependencies};
use crate::graph::Digraph;
use crate::planner::{ChangeId, ChangeKind, ChangePlan, PlanHasher, ReconciliationChange};
use crate::reconciler::{DeploymentSummary, ReconciliationReport};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Conflict row for table display.
#[derive(Tabled)]
struct ConflictRow {
    #[tabled(rename = "First")]
    first: String,
    #[tabled(rename = "Second")]
    second: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Missing dependency row for table display.
#[derive(Tabled)]
struct MissingRow {
    #[tabled(rename = "Deployment")]
    deployment: String,
    #[tabled(rename = "Requires")]
    requirement: String,
    #[tabled(rename = "Declared in")]
    source: String,
    #[tabled(rename = "Closest candidates")]
    candidates: String,
}

/// Plan change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Stack")]
    stack: String,
    #[tabled(rename = "Deployment")]
    deployment: String,
    #[tabled(rename = "After")]
    after: String,
}

/// Deployment row for table display.
#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "Deployment")]
    name: String,
    #[tabled(rename = "Stack")]
    stack: String,
    #[tabled(rename = "Features")]
    enabled: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
    #[tabled(rename = "Images")]
    images: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns true if output is a single JSON document.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Formats the result of an input check: warnings, conflicts and missing dependencies.
    #[must_use]
    pub fn format_check(
        &self,
        warnings: &[String],
        conflicts: &[DeploymentConflictReport],
        missing: &[MissingDependencies],
    ) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&CheckJson {
                warnings,
                conflicts,
                missing,
            })
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!("{} Input is valid!\n", "✓".green());
                if !warnings.is_empty() {
                    let _ = writeln!(output, "\nWarnings:");
                    for warning in warnings {
                        let _ = writeln!(output, "  - {warning}");
                    }
                }
                output.push('\n');
                output.push_str(&Self::format_conflicts_text(conflicts));
                output.push_str(&Self::format_missing_text(missing));
                output
            }
        }
    }

    /// Formats conflict reports as text.
    fn format_conflicts_text(reports: &[DeploymentConflictReport]) -> String {
        if reports.is_empty() {
            return format!("{} No conflicts between deployments.\n", "✓".green());
        }

        let mut rows = Vec::new();
        for report in reports {
            if report.name {
                rows.push(ConflictRow {
                    first: report.first.clone(),
                    second: report.second.clone(),
                    resource: String::from("name"),
                    reason: String::from("same deployment name"),
                });
            }
            for conflict in report.resource_conflicts() {
                rows.push(ConflictRow {
                    first: report.first.clone(),
                    second: report.second.clone(),
                    resource: conflict.first.resource.to_string(),
                    reason: Self::truncate(&conflict.reasons.join("; "), 60),
                });
            }
        }

        let mut output = format!("{} {} conflicting deployment pairs:\n\n", "⚠".yellow(), reports.len());
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    /// Formats missing dependency reports as text.
    fn format_missing_text(reports: &[MissingDependencies]) -> String {
        if reports.is_empty() {
            return format!("{} All dependencies are satisfied.\n", "✓".green());
        }

        let rows: Vec<MissingRow> = reports
            .iter()
            .flat_map(|report| {
                report.widened().into_iter().map(|missing| {
                    let candidates: Vec<String> = missing
                        .best_candidates
                        .iter()
                        .map(|c| format!("{} ({})", c.provider, c.mismatches.join(", ")))
                        .collect();
                    MissingRow {
                        deployment: report.deployment.clone(),
                        requirement: missing.required.resource.to_string(),
                        source: missing.required.source_path(),
                        candidates: if candidates.is_empty() {
                            String::from("none")
                        } else {
                            Self::truncate(&candidates.join("; "), 60)
                        },
                    }
                })
            })
            .collect();

        let count: usize = reports.iter().map(MissingDependencies::len).sum();
        let mut output = format!("{} {} missing dependencies:\n\n", "✗".red(), count);
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    /// Formats the change plan of a reconciliation for display.
    ///
    /// Detailed output also lists every desired deployment with its
    /// features and images.
    #[must_use]
    pub fn format_plan(&self, report: &ReconciliationReport, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let mut json = PlanJson::new(&report.plan, &report.digest);
                if detailed {
                    json.deployments = Some(report.deployments.clone());
                }
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = Self::format_plan_text(&report.plan, &report.digest, detailed);
                if detailed {
                    output.push_str(&Self::format_deployments_text(&report.deployments));
                }
                output
            }
        }
    }

    /// Formats desired deployments as a table.
    fn format_deployments_text(deployments: &[DeploymentSummary]) -> String {
        if deployments.is_empty() {
            return String::new();
        }
        let rows: Vec<DeploymentRow> = deployments
            .iter()
            .map(|deployment| DeploymentRow {
                name: deployment.name.clone(),
                stack: if deployment.defines_app {
                    deployment.stack.clone()
                } else {
                    String::from("(no app)")
                },
                enabled: Self::list_or_dash(&deployment.enabled_features),
                disabled: Self::list_or_dash(&deployment.disabled_features),
                images: Self::list_or_dash(&deployment.images),
            })
            .collect();

        let mut output = String::from("\nDeployments:\n");
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &ChangePlan, digest: &str, detailed: bool) -> String {
        if plan.is_empty() {
            return format!("{} No changes required - stacks are up to date.\n", "✓".green());
        }

        let mut output = String::new();
        let _ = writeln!(output, "\nChange Plan");
        let _ = write!(output, "   Digest: {}\n\n", PlanHasher::new().short_hash(digest));

        let changes: Vec<&ReconciliationChange> = plan
            .ordered_changes()
            .unwrap_or_else(|| plan.changes.iter().collect());

        let rows: Vec<ChangeRow> = changes
            .iter()
            .enumerate()
            .map(|(i, change)| {
                let after: Vec<&str> = plan
                    .dependencies_of(&change.id())
                    .into_iter()
                    .map(|id| id.as_str())
                    .collect();
                ChangeRow {
                    index: i + 1,
                    action: Self::format_change_kind(change.kind()),
                    stack: change.name().to_string(),
                    deployment: change
                        .deployment()
                        .map_or_else(|| String::from("-"), |d| d.name.clone()),
                    after: if detailed {
                        after.join(", ")
                    } else {
                        Self::truncate(&after.join(", "), 30)
                    },
                }
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = write!(
            output,
            "\nPlan: {} to add, {} to update, {} to remove\n",
            plan.count(ChangeKind::Add).to_string().green(),
            plan.count(ChangeKind::Update).to_string().yellow(),
            plan.count(ChangeKind::Remove).to_string().red()
        );

        if detailed {
            let ready: Vec<&str> = plan
                .ready_changes()
                .into_iter()
                .map(ReconciliationChange::name)
                .collect();
            let _ = writeln!(output, "Ready to start: {}", ready.join(", "));
        }

        if plan.has_cycles() {
            let _ = write!(output, "\n{} Dependency cycles:\n", "⚠".yellow());
            for cycle in &plan.cycles {
                let names: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
                let _ = writeln!(output, "   - {}", names.join(" -> "));
            }
        }

        output
    }

    /// Formats the deployment dependency graph.
    #[must_use]
    pub fn format_graph(&self, graph: &Digraph<String>) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&GraphJson::from(graph)).unwrap_or_default()
            }
            OutputFormat::Text => {
                if graph.is_empty() {
                    return String::from("No deployments.\n");
                }
                let mut output = String::new();
                for node in graph.nodes() {
                    let dependencies: Vec<&str> =
                        graph.dependencies_of(node).map(String::as_str).collect();
                    if dependencies.is_empty() {
                        let _ = writeln!(output, "{}", node.bold());
                    } else {
                        let _ = writeln!(output, "{} -> {}", node.bold(), dependencies.join(", "));
                    }
                }
                output
            }
        }
    }

    /// Joins items with commas, or a dash when there are none.
    fn list_or_dash(items: &[String]) -> String {
        if items.is_empty() {
            String::from("-")
        } else {
            items.join(", ")
        }
    }

    /// Formats a change kind with color.
    fn format_change_kind(kind: ChangeKind) -> String {
        match kind {
            ChangeKind::Add => "+add".green().to_string(),
            ChangeKind::Update => "~update".yellow().to_string(),
            ChangeKind::Remove => "-remove".red().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct CheckJson<'a> {
    warnings: &'a [String],
    conflicts: &'a [DeploymentConflictReport],
    missing: &'a [MissingDependencies],
}

#[derive(Serialize)]
struct PlanJson {
    digest: String,
    adds: usize,
    updates: usize,
    removes: usize,
    changes: Vec<ChangeJson>,
    order: Option<Vec<String>>,
    cycles: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployments: Option<Vec<DeploymentSummary>>,
}

#[derive(Serialize)]
struct ChangeJson {
    kind: ChangeKind,
    stack: String,
    deployment: Option<String>,
    after: Vec<String>,
}

impl PlanJson {
    fn new(plan: &ChangePlan, digest: &str) -> Self {
        let ids = |ids: &[ChangeId]| -> Vec<String> {
            ids.iter().map(ToString::to_string).collect()
        };
        Self {
            digest: digest.to_string(),
            adds: plan.count(ChangeKind::Add),
            updates: plan.count(ChangeKind::Update),
            removes: plan.count(ChangeKind::Remove),
            changes: plan
                .changes
                .iter()
                .map(|change| ChangeJson {
                    kind: change.kind(),
                    stack: change.name().to_string(),
                    deployment: change.deployment().map(|d| d.name.clone()),
                    after: plan
                        .dependencies_of(&change.id())
                        .into_iter()
                        .map(ToString::to_string)
                        .collect(),
                })
                .collect(),
            order: plan.order.as_deref().map(ids),
            cycles: plan.cycles.iter().map(|cycle| ids(cycle.as_slice())).collect(),
            deployments: None,
        }
    }
}

#[derive(Serialize)]
struct GraphJson {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

impl From<&Digraph<String>> for GraphJson {
    fn from(graph: &Digraph<String>) -> Self {
        Self {
            nodes: graph.nodes().cloned().collect(),
            edges: graph
                .edges()
                .map(|(from, to)| (from.clone(), to.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::package::{DeploymentSpec, FeatureSpec, PackageDefinition, ResolvedDeployment};
    use crate::reconciler::Reconciler;
    use std::collections::HashMap;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("ééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_graph_json() {
        let mut graph = Digraph::new();
        graph.add_edge(String::from("web"), String::from("db"));
        let output = OutputFormatter::new(OutputFormat::Json).format_graph(&graph);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["nodes"], serde_json::json!(["db", "web"]));
        assert_eq!(value["edges"], serde_json::json!([["web", "db"]]));
    }

    #[test]
    fn test_empty_reports_text() {
        let output = OutputFormatter::new(OutputFormat::Text).format_check(&[], &[], &[]);
        assert!(output.contains("Input is valid"));
        assert!(output.contains("No conflicts"));
        assert!(output.contains("satisfied"));
    }

    #[test]
    fn test_check_json_is_single_document() {
        let warnings = vec![String::from("Stack 'old' belongs to no deployment and will be removed")];
        let output = OutputFormatter::new(OutputFormat::Json).format_check(&warnings, &[], &[]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["warnings"], serde_json::json!(warnings));
        assert_eq!(value["conflicts"], serde_json::json!([]));
        assert_eq!(value["missing"], serde_json::json!([]));
    }

    fn plan_output(detailed: bool, format: OutputFormat) -> String {
        let package = PackageDefinition {
            path: String::from("example.com/web"),
            deployment: DeploymentSpec {
                definition_files: vec![String::from("compose.yml")],
                images: vec![String::from("nginx:1.27")],
                ..DeploymentSpec::default()
            },
            features: HashMap::from([
                (String::from("tls"), FeatureSpec::default()),
                (String::from("metrics"), FeatureSpec::default()),
            ]),
            ..PackageDefinition::default()
        };
        let deployments = vec![ResolvedDeployment::new("web", package, ["tls"]).unwrap()];
        let stacks = HashMap::new();
        let report = Reconciler::new(&deployments, &stacks, PlannerConfig::default())
            .reconcile()
            .unwrap();
        OutputFormatter::new(format).format_plan(&report, detailed)
    }

    #[test]
    fn test_detailed_plan_json_lists_deployments() {
        let value: serde_json::Value =
            serde_json::from_str(&plan_output(true, OutputFormat::Json)).unwrap();
        let deployment = &value["deployments"][0];
        assert_eq!(deployment["name"], "web");
        assert_eq!(deployment["enabled_features"], serde_json::json!(["tls"]));
        assert_eq!(deployment["disabled_features"], serde_json::json!(["metrics"]));
        assert_eq!(deployment["images"], serde_json::json!(["nginx:1.27"]));

        let brief: serde_json::Value =
            serde_json::from_str(&plan_output(false, OutputFormat::Json)).unwrap();
        assert!(brief.get("deployments").is_none());
        assert_eq!(brief["adds"], 1);
    }

    #[test]
    fn test_detailed_plan_text_lists_deployments() {
        let output = plan_output(true, OutputFormat::Text);
        assert!(output.contains("Deployments:"));
        assert!(output.contains("nginx:1.27"));
        assert!(output.contains("metrics"));
        assert!(!plan_output(false, OutputFormat::Text).contains("Deployments:"));
    }
}
