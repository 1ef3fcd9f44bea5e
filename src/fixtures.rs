//! Bundled mock data. Every screen draws from these; nothing is fetched.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::fixes::FixIssue;
use crate::report::ReportFixture;
use crate::results::ResultRecord;
use crate::setup::DiagnosticTest;

static CATALOG: LazyLock<Vec<DiagnosticTest>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../fixtures/catalog.json")).expect("bundled catalog.json")
});

static RESULTS: LazyLock<Vec<ResultRecord>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../fixtures/results.json")).expect("bundled results.json")
});

static FIXES: LazyLock<Vec<FixIssue>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../fixtures/fixes.json")).expect("bundled fixes.json")
});

static REPORT: LazyLock<ReportFixture> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../fixtures/report.json")).expect("bundled report.json")
});

static DASHBOARD: LazyLock<DashboardFixture> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../fixtures/dashboard.json"))
        .expect("bundled dashboard.json")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    pub name: String,
    pub url: String,
    pub klaviyo_account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanInfo {
    pub date: String,
    pub time: String,
    pub duration: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub tracking: u8,
    pub sync: u8,
    pub configuration: u8,
    pub compliance: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthScore {
    pub overall: u8,
    pub breakdown: HealthBreakdown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFixture {
    pub store: StoreInfo,
    pub scan: ScanInfo,
    pub health_score: HealthScore,
}

pub fn catalog() -> &'static [DiagnosticTest] {
    &CATALOG
}

pub fn results() -> &'static [ResultRecord] {
    &RESULTS
}

/// Result records limited to the given test ids, fixture order kept.
pub fn results_for(test_ids: &[String]) -> Vec<ResultRecord> {
    RESULTS
        .iter()
        .filter(|r| test_ids.iter().any(|id| id == &r.id))
        .cloned()
        .collect()
}

pub fn fix_issues() -> Vec<FixIssue> {
    FIXES.clone()
}

pub fn report() -> &'static ReportFixture {
    &REPORT
}

pub fn dashboard() -> &'static DashboardFixture {
    &DASHBOARD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixes::FixSeverity;
    use crate::results::{ResultStatus, Severity};
    use std::collections::HashSet;

    #[test]
    fn test_catalog_loads() {
        let ids: Vec<_> = catalog().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), 7);
        assert_eq!(ids[0], "purchase-tracking");
        assert_eq!(ids[6], "gdpr-consent");
    }

    #[test]
    fn test_every_catalog_test_has_a_result() {
        let result_ids: HashSet<_> = results().iter().map(|r| r.id.as_str()).collect();
        for test in catalog() {
            assert!(result_ids.contains(test.id.as_str()), "missing {}", test.id);
        }
    }

    #[test]
    fn test_results_shape() {
        let records = results();
        assert_eq!(records.len(), 7);
        let failed = records.iter().filter(|r| r.status == ResultStatus::Failed).count();
        let critical = records
            .iter()
            .filter(|r| r.severity == Some(Severity::Critical))
            .count();
        assert_eq!(failed, 3);
        assert_eq!(critical, 2);
        assert!(records[0].code_snippet.is_some());
        assert!(records[6].affected_data.is_empty());
    }

    #[test]
    fn test_results_for_subset() {
        let subset = results_for(&["gdpr-consent".to_string(), "purchase-tracking".to_string()]);
        let ids: Vec<_> = subset.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["purchase-tracking", "gdpr-consent"]);
    }

    #[test]
    fn test_fix_issues_load() {
        let issues = fix_issues();
        assert_eq!(issues.len(), 6);
        assert_eq!(issues[0].id, "api-key-invalid");
        assert_eq!(issues[0].severity, FixSeverity::High);
        assert!(!issues[0].steps.is_empty());
        assert!(issues[1].completed);
    }

    #[test]
    fn test_report_fixture() {
        let report = report();
        assert_eq!(report.sections.len(), 6);
        let required: Vec<_> = report
            .sections
            .iter()
            .filter(|s| s.required)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(required, vec!["executive-summary", "detailed-findings"]);
        let stages: Vec<_> = report.generation_stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(stages, vec!["analyzing", "formatting", "generating", "finalizing"]);
    }

    #[test]
    fn test_dashboard_fixture() {
        let dashboard = dashboard();
        assert_eq!(dashboard.health_score.overall, 42);
        assert_eq!(dashboard.health_score.breakdown.sync, 30);
        assert_eq!(dashboard.store.url, "techstyle-boutique.myshopify.com");
    }
}
