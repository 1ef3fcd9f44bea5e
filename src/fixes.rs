//! Technical fix instructions: remediation guides per issue and the
//! per-session checklist tracking which ones are done.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FixSeverity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixStep {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixIssue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: FixSeverity,
    pub estimated_time: String,
    pub difficulty: String,
    pub required_skills: String,
    pub completed: bool,
    pub problem_description: String,
    pub root_cause: String,
    pub steps: Vec<FixStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing: Option<String>,
    #[serde(default)]
    pub testing_steps: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CompletionStats {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// Sidebar narrowing: case-insensitive text match on title or description,
/// plus an optional severity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub severity: Option<FixSeverity>,
}

impl IssueQuery {
    pub fn matches(&self, issue: &FixIssue) -> bool {
        let text_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                issue.title.to_lowercase().contains(&term)
                    || issue.description.to_lowercase().contains(&term)
            }
        };
        text_ok && self.severity.map_or(true, |s| issue.severity == s)
    }
}

#[derive(Debug, Clone)]
pub struct FixChecklist {
    issues: Vec<FixIssue>,
    selected: Option<String>,
}

impl FixChecklist {
    /// Starts on the first open high-severity issue, else the first issue.
    pub fn new(issues: Vec<FixIssue>) -> Self {
        let selected = issues
            .iter()
            .find(|i| i.severity == FixSeverity::High && !i.completed)
            .or_else(|| issues.first())
            .map(|i| i.id.clone());
        Self { issues, selected }
    }

    pub fn issues(&self) -> &[FixIssue] {
        &self.issues
    }

    pub fn filtered(&self, query: &IssueQuery) -> Vec<&FixIssue> {
        self.issues.iter().filter(|i| query.matches(i)).collect()
    }

    pub fn selected(&self) -> Option<&FixIssue> {
        let id = self.selected.as_deref()?;
        self.issues.iter().find(|i| i.id == id)
    }

    /// Returns false for an unknown id, leaving the selection alone.
    pub fn select(&mut self, issue_id: &str) -> bool {
        if self.issues.iter().any(|i| i.id == issue_id) {
            self.selected = Some(issue_id.to_string());
            true
        } else {
            false
        }
    }

    /// Flip an issue's completed flag. Returns the new flag.
    pub fn toggle_complete(&mut self, issue_id: &str) -> Option<bool> {
        let issue = self.issues.iter_mut().find(|i| i.id == issue_id)?;
        issue.completed = !issue.completed;
        Some(issue.completed)
    }

    pub fn stats(&self) -> CompletionStats {
        let total = self.issues.len();
        let completed = self.issues.iter().filter(|i| i.completed).count();
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        CompletionStats {
            completed,
            total,
            percentage,
        }
    }

    pub fn remaining_high_priority(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == FixSeverity::High && !i.completed)
            .count()
    }
}
