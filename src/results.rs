//! Diagnostic result records and the filter/sort pass over them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Passed,
    Failed,
    Warning,
    #[serde(other)]
    Unknown,
}

impl ResultStatus {
    fn priority(self) -> u8 {
        match self {
            ResultStatus::Failed => 0,
            ResultStatus::Warning => 1,
            ResultStatus::Passed => 2,
            ResultStatus::Unknown => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    #[serde(other)]
    Unknown,
}

impl Severity {
    fn priority(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
            Severity::Unknown => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffectedData {
    #[serde(rename = "type")]
    pub kind: String,
    pub example: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub tooltip: String,
    pub findings: String,
    #[serde(default)]
    pub affected_data: Vec<AffectedData>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl ResultRecord {
    fn severity_priority(&self) -> u8 {
        self.severity.map(Severity::priority).unwrap_or(3)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResultFilter {
    #[default]
    All,
    Critical,
    Warning,
    Passed,
    Failed,
}

impl ResultFilter {
    pub const ALL: [ResultFilter; 5] = [
        ResultFilter::All,
        ResultFilter::Critical,
        ResultFilter::Warning,
        ResultFilter::Passed,
        ResultFilter::Failed,
    ];

    pub fn matches(self, record: &ResultRecord) -> bool {
        match self {
            ResultFilter::All => true,
            ResultFilter::Critical => record.severity == Some(Severity::Critical),
            ResultFilter::Warning => record.severity == Some(Severity::Warning),
            ResultFilter::Passed => record.status == ResultStatus::Passed,
            ResultFilter::Failed => record.status == ResultStatus::Failed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResultFilter::All => "All Tests",
            ResultFilter::Critical => "Critical Issues",
            ResultFilter::Warning => "Warnings",
            ResultFilter::Passed => "Passed",
            ResultFilter::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Severity,
    Name,
    Status,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Severity => "By Severity",
            SortKey::Name => "By Test Name",
            SortKey::Status => "By Status",
        }
    }
}

/// Case-insensitive comparison, falling back to the raw strings so the order
/// is total.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Filter then sort. The input slice is never touched; sorts are stable.
pub fn classify(
    records: &[ResultRecord],
    filter: ResultFilter,
    sort: SortKey,
) -> Vec<ResultRecord> {
    let mut view: Vec<ResultRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();

    match sort {
        SortKey::Severity => view.sort_by_key(|r| r.severity_priority()),
        SortKey::Name => view.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::Status => view.sort_by_key(|r| r.status.priority()),
    }
    view
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_issues: usize,
    pub critical_issues: usize,
    pub warnings: usize,
    pub passed_tests: usize,
}

pub fn summarize(records: &[ResultRecord]) -> SummaryMetrics {
    SummaryMetrics {
        total_issues: records
            .iter()
            .filter(|r| r.status != ResultStatus::Passed)
            .count(),
        critical_issues: records
            .iter()
            .filter(|r| ResultFilter::Critical.matches(r))
            .count(),
        warnings: records
            .iter()
            .filter(|r| ResultFilter::Warning.matches(r))
            .count(),
        passed_tests: records
            .iter()
            .filter(|r| ResultFilter::Passed.matches(r))
            .count(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub id: ResultFilter,
    pub label: &'static str,
    pub count: usize,
}

pub fn filter_options(records: &[ResultRecord]) -> Vec<FilterOption> {
    ResultFilter::ALL
        .iter()
        .map(|f| FilterOption {
            id: *f,
            label: f.label(),
            count: records.iter().filter(|r| f.matches(r)).count(),
        })
        .collect()
}

/// Expanded/collapsed cards of one results view.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    /// Returns the new expanded flag.
    pub fn toggle(&mut self, record_id: &str) -> bool {
        if self.expanded.remove(record_id) {
            false
        } else {
            self.expanded.insert(record_id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, record_id: &str) -> bool {
        self.expanded.contains(record_id)
    }
}

/// Filter, sort and expansion for one consumer.
#[derive(Debug, Clone, Default)]
pub struct ResultsView {
    pub filter: ResultFilter,
    pub sort: SortKey,
    pub expanded: ExpansionState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCard {
    #[serde(flatten)]
    pub record: ResultRecord,
    pub expanded: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPage {
    pub filter: ResultFilter,
    pub sort: SortKey,
    pub cards: Vec<ResultCard>,
    /// Nothing matched the active filter; render the "no results" panel.
    pub no_results: bool,
    pub summary: SummaryMetrics,
    pub filter_options: Vec<FilterOption>,
}

impl ResultsView {
    pub fn render(&self, records: &[ResultRecord]) -> ResultsPage {
        let cards: Vec<ResultCard> = classify(records, self.filter, self.sort)
            .into_iter()
            .map(|record| ResultCard {
                expanded: self.expanded.is_expanded(&record.id),
                record,
            })
            .collect();

        ResultsPage {
            filter: self.filter,
            sort: self.sort,
            no_results: cards.is_empty(),
            cards,
            summary: summarize(records),
            filter_options: filter_options(records),
        }
    }
}
