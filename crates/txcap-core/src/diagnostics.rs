//! Data-quality diagnostics collected while a run degrades gracefully.
//!
//! Unresolved buses, unspecified ratings and undefined reactances never abort
//! a run. They drop rows or leave fields null, and each such decision is
//! counted here so the caller can see what the output is missing.
//!
//! # Example
//!
//! ```
//! use txcap_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_count("unresolved_bus", "buses without a county", 3);
//! diag.add_info("multi_substation", "first substation kept for 2 buses");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.issues_by_category("unresolved_bus").count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only (e.g., deterministic tie-break applied)
    Info,
    /// Output degraded (rows dropped or values left undefined)
    Warning,
}

/// A single diagnostic issue encountered during a run
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g., "unresolved_bus", "rating", "reactance")
    pub category: String,
    pub message: String,
    /// Number of rows the issue applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Optional entity reference (e.g., "bus 14", "branch table")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            count: None,
            entity: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(count) = self.count {
            write!(f, " (x{})", count)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_info(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Info, category, message));
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    /// Add a warning covering `count` rows; zero counts are not recorded.
    pub fn add_warning_count(&mut self, category: &str, message: &str, count: usize) {
        if count == 0 {
            return;
        }
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, category, message).with_count(count),
        );
    }

    /// Add an informational issue covering `count` rows; zero counts are not recorded.
    pub fn add_info_count(&mut self, category: &str, message: &str, count: usize) {
        if count == 0 {
            return;
        }
        self.issues
            .push(DiagnosticIssue::new(Severity::Info, category, message).with_count(count));
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Info)
            .count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Total row count recorded under a category
    pub fn count_for(&self, category: &str) -> usize {
        self.issues_by_category(category)
            .map(|i| i.count.unwrap_or(1))
            .sum()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let infos = self.info_count();

        match (warnings, infos) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, i) => format!("{} note{}", i, if i == 1 { "" } else { "s" }),
            (w, i) => format!(
                "{} warning{}, {} note{}",
                w,
                if w == 1 { "" } else { "s" },
                i,
                if i == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

// ============================================================================
// Run-Specific Extensions
// ============================================================================

/// Row counts at each stage of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub buses: usize,
    pub buses_resolved: usize,
    pub substations: usize,
    pub substations_resolved: usize,
    pub branches: usize,
    pub branches_aggregated: usize,
    pub dc_links: usize,
    pub dc_links_aggregated: usize,
    pub ac_edges: usize,
    pub hvdc_edges: usize,
}

/// Complete diagnostics for a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunDiagnostics {
    pub stats: RunStats,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

impl RunDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}/{} buses resolved, {}/{} branches and {}/{} DC links aggregated into {} AC + {} HVDC edges; {}",
            self.stats.buses_resolved,
            self.stats.buses,
            self.stats.branches_aggregated,
            self.stats.branches,
            self.stats.dc_links_aggregated,
            self.stats.dc_links,
            self.stats.ac_edges,
            self.stats.hvdc_edges,
            self.diagnostics.summary()
        )
    }
}

impl std::fmt::Display for RunDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for issue in &self.diagnostics.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
