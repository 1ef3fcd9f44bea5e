//! Setup screen: store URL plus the set of diagnostic tests to run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::SECONDS_PER_TEST_ESTIMATE;
use crate::handoff::ScanHandoff;
use crate::progress::StageDefinition;
use crate::store_url::{StoreUrlField, UrlRejection, ValidationAttempt};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestPriority {
    Critical,
    High,
    Medium,
}

/// One entry of the diagnostic test catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticTest {
    pub id: String,
    pub title: String,
    pub severity: TestPriority,
    pub description: String,
    pub estimated_time: String,
    pub impact: String,
    /// What the scan screen says while this test runs.
    pub scan_description: String,
}

impl DiagnosticTest {
    pub fn stage(&self) -> StageDefinition {
        StageDefinition::new(&self.id, &self.title, &self.scan_description)
    }
}

/// Stages for the selected tests, in catalog order. Unknown ids are dropped.
pub fn stages_for(catalog: &[DiagnosticTest], selected: &[String]) -> Vec<StageDefinition> {
    catalog
        .iter()
        .filter(|t| selected.iter().any(|id| id == &t.id))
        .map(DiagnosticTest::stage)
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartScanGate {
    pub can_start: bool,
    pub label: String,
    pub estimated_minutes: u32,
}

impl StartScanGate {
    pub fn evaluate(is_url_valid: bool, selected_count: usize) -> Self {
        let label = if !is_url_valid {
            "Enter Valid Store URL".to_string()
        } else if selected_count == 0 {
            "Select Tests to Continue".to_string()
        } else {
            format!("Start Diagnostic Scan ({selected_count} tests)")
        };
        Self {
            can_start: is_url_valid && selected_count > 0,
            label,
            estimated_minutes: estimate_minutes(selected_count),
        }
    }
}

pub fn estimate_minutes(selected_count: usize) -> u32 {
    (selected_count as f64 * SECONDS_PER_TEST_ESTIMATE / 60.0).ceil() as u32
}

#[derive(Debug, Clone, Default)]
pub struct SetupSelection {
    url: StoreUrlField,
    is_url_valid: bool,
    selected_tests: BTreeSet<String>,
}

impl SetupSelection {
    pub fn url(&self) -> &StoreUrlField {
        &self.url
    }

    pub fn is_url_valid(&self) -> bool {
        self.is_url_valid
    }

    pub fn selected_tests(&self) -> &BTreeSet<String> {
        &self.selected_tests
    }

    pub fn edit_url(&mut self, text: impl Into<String>) {
        self.url.edit(text);
        self.is_url_valid = false;
    }

    pub fn blur_url(&mut self) -> Option<ValidationAttempt> {
        self.url.blur()
    }

    /// Apply a finished check; the validity flag only moves on a fresh verdict.
    pub fn resolve_url(
        &mut self,
        attempt: &ValidationAttempt,
        verdict: Result<(), UrlRejection>,
    ) -> Option<bool> {
        let notified = self.url.resolve(attempt, verdict)?;
        self.is_url_valid = notified;
        Some(notified)
    }

    /// Returns true when the test is now selected.
    pub fn toggle_test(&mut self, test_id: &str) -> bool {
        if self.selected_tests.remove(test_id) {
            false
        } else {
            self.selected_tests.insert(test_id.to_string());
            true
        }
    }

    pub fn select_all(&mut self, catalog: &[DiagnosticTest]) {
        self.selected_tests = catalog.iter().map(|t| t.id.clone()).collect();
    }

    pub fn clear(&mut self) {
        self.selected_tests.clear();
    }

    pub fn gate(&self) -> StartScanGate {
        StartScanGate::evaluate(self.is_url_valid, self.selected_tests.len())
    }

    /// Handoff for the scan, or `None` while the gate is closed.
    pub fn handoff(&self, catalog: &[DiagnosticTest], timestamp: i64) -> Option<ScanHandoff> {
        if !self.gate().can_start {
            return None;
        }
        let selected_test_ids = catalog
            .iter()
            .filter(|t| self.selected_tests.contains(&t.id))
            .map(|t| t.id.clone())
            .collect();
        Some(ScanHandoff {
            store_url: self.url.text().trim().to_string(),
            selected_test_ids,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test(id: &str) -> DiagnosticTest {
        DiagnosticTest {
            id: id.to_string(),
            title: format!("{id} title"),
            severity: TestPriority::High,
            description: String::new(),
            estimated_time: "1-2 min".to_string(),
            impact: String::new(),
            scan_description: format!("checking {id}"),
        }
    }

    fn catalog() -> Vec<DiagnosticTest> {
        vec![test("one"), test("two"), test("three")]
    }

    fn valid_selection() -> SetupSelection {
        let mut selection = SetupSelection::default();
        selection.edit_url("https://my-shop.myshopify.com");
        let attempt = selection.blur_url().unwrap();
        assert_eq!(selection.resolve_url(&attempt, Ok(())), Some(true));
        selection
    }

    #[test]
    fn test_gate_labels() {
        assert_eq!(StartScanGate::evaluate(false, 3).label, "Enter Valid Store URL");
        assert_eq!(StartScanGate::evaluate(true, 0).label, "Select Tests to Continue");
        let gate = StartScanGate::evaluate(true, 3);
        assert!(gate.can_start);
        assert_eq!(gate.label, "Start Diagnostic Scan (3 tests)");
    }

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_minutes(0), 0);
        assert_eq!(estimate_minutes(1), 3);
        assert_eq!(estimate_minutes(2), 5);
        assert_eq!(estimate_minutes(7), 18);
    }

    #[test]
    fn test_toggle_select_all_clear() {
        let mut selection = SetupSelection::default();
        assert!(selection.toggle_test("two"));
        assert!(!selection.toggle_test("two"));
        selection.select_all(&catalog());
        assert_eq!(selection.selected_tests().len(), 3);
        selection.clear();
        assert!(selection.selected_tests().is_empty());
    }

    #[test]
    fn test_edit_drops_validity() {
        let mut selection = valid_selection();
        assert!(selection.is_url_valid());
        selection.edit_url("https://other.myshopify.com");
        assert!(!selection.is_url_valid());
    }

    #[test]
    fn test_handoff_in_catalog_order() {
        let mut selection = valid_selection();
        assert!(selection.handoff(&catalog(), 1).is_none());

        selection.toggle_test("three");
        selection.toggle_test("one");
        let handoff = selection.handoff(&catalog(), 42).unwrap();
        assert_eq!(handoff.selected_test_ids, vec!["one", "three"]);
        assert_eq!(handoff.store_url, "https://my-shop.myshopify.com");
        assert_eq!(handoff.timestamp, 42);
    }

    #[test]
    fn test_stages_for_selection() {
        let stages = stages_for(
            &catalog(),
            &["three".to_string(), "missing".to_string(), "two".to_string()],
        );
        let ids: Vec<_> = stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["two", "three"]);
        assert_eq!(stages[0].description, "checking two");
    }
}
