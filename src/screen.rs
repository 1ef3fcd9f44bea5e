//! Screens of the workflow and the chrome each one shows.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Setup,
    Scan,
    Results,
    FixInstructions,
    Report,
    NotFound,
}

impl Screen {
    pub fn from_path(path: &str) -> Screen {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/store-url-input-test-selection" => Screen::Setup,
            "/diagnostic-scan-progress" => Screen::Scan,
            "/diagnostic-results-dashboard" => Screen::Results,
            "/technical-fix-instructions" => Screen::FixInstructions,
            "/pdf-report-generation-lead-capture" => Screen::Report,
            _ => Screen::NotFound,
        }
    }

    /// Canonical path. `NotFound` has none of its own.
    pub fn path(self) -> &'static str {
        match self {
            Screen::Setup => "/store-url-input-test-selection",
            Screen::Scan => "/diagnostic-scan-progress",
            Screen::Results => "/diagnostic-results-dashboard",
            Screen::FixInstructions => "/technical-fix-instructions",
            Screen::Report => "/pdf-report-generation-lead-capture",
            Screen::NotFound => "/404",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Setup => "Store Setup - Klaviyo Health Scanner",
            Screen::Scan => "Diagnostic Scan - Klaviyo Health Scanner",
            Screen::Results => "Diagnostic Results - Klaviyo Health Scanner",
            Screen::FixInstructions => "Technical Fix Instructions - Klaviyo Health Scanner",
            Screen::Report => "Generate Report - Klaviyo Health Scanner",
            Screen::NotFound => "Page Not Found - Klaviyo Health Scanner",
        }
    }

    pub fn workflow_step(self) -> Option<WorkflowStep> {
        let (number, label) = match self {
            Screen::Setup => (1, "Setup"),
            Screen::Scan => (2, "Scanning"),
            Screen::Results => (3, "Results"),
            Screen::Report => (4, "Report"),
            Screen::FixInstructions | Screen::NotFound => return None,
        };
        Some(WorkflowStep { number, label })
    }

    pub fn chrome(self) -> ScreenChrome {
        use ContextualActionKind::*;

        let actions = match self {
            Screen::Results => vec![
                ContextualAction::primary("Generate Report", Navigate(Screen::Report)),
                ContextualAction::secondary("Export Data", ExportResults),
                ContextualAction::secondary(
                    "View Technical Fixes",
                    Navigate(Screen::FixInstructions),
                ),
            ],
            Screen::Report => vec![
                ContextualAction::primary("Download PDF", DownloadReport),
                ContextualAction::secondary("Email Report", EmailReport),
                ContextualAction::secondary("Back to Results", Navigate(Screen::Results)),
            ],
            Screen::Scan => vec![ContextualAction::secondary("Cancel Scan", CancelScan)],
            Screen::Setup | Screen::FixInstructions | Screen::NotFound => Vec::new(),
        };

        ScreenChrome {
            screen: self,
            title: self.title(),
            workflow_step: self.workflow_step(),
            actions,
            technical_sidebar: self == Screen::FixInstructions,
        }
    }
}

impl Serialize for Screen {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let name = match self {
            Screen::Setup => "setup",
            Screen::Scan => "scan",
            Screen::Results => "results",
            Screen::FixInstructions => "fix_instructions",
            Screen::Report => "report",
            Screen::NotFound => "not_found",
        };
        serializer.serialize_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WorkflowStep {
    pub number: u8,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextualActionKind {
    Navigate(Screen),
    ExportResults,
    DownloadReport,
    EmailReport,
    CancelScan,
}

impl Serialize for ContextualActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContextualActionKind::Navigate(screen) => {
                serializer.serialize_str(&format!("navigate:{}", screen.path()))
            }
            ContextualActionKind::ExportResults => serializer.serialize_str("export_results"),
            ContextualActionKind::DownloadReport => serializer.serialize_str("download_report"),
            ContextualActionKind::EmailReport => serializer.serialize_str("email_report"),
            ContextualActionKind::CancelScan => serializer.serialize_str("cancel_scan"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContextualAction {
    pub label: &'static str,
    pub action: ContextualActionKind,
    pub primary: bool,
}

impl ContextualAction {
    fn primary(label: &'static str, action: ContextualActionKind) -> Self {
        Self {
            label,
            action,
            primary: true,
        }
    }

    fn secondary(label: &'static str, action: ContextualActionKind) -> Self {
        Self {
            label,
            action,
            primary: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenChrome {
    pub screen: Screen,
    pub title: &'static str,
    pub workflow_step: Option<WorkflowStep>,
    pub actions: Vec<ContextualAction>,
    pub technical_sidebar: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(Screen::from_path("/"), Screen::Setup);
        assert_eq!(Screen::from_path(""), Screen::Setup);
        assert_eq!(Screen::from_path("/store-url-input-test-selection"), Screen::Setup);
        assert_eq!(Screen::from_path("/diagnostic-scan-progress"), Screen::Scan);
        assert_eq!(Screen::from_path("/diagnostic-results-dashboard/"), Screen::Results);
        assert_eq!(Screen::from_path("/technical-fix-instructions"), Screen::FixInstructions);
        assert_eq!(
            Screen::from_path("/pdf-report-generation-lead-capture?x=1"),
            Screen::Report
        );
        assert_eq!(Screen::from_path("/nope"), Screen::NotFound);
    }

    #[test]
    fn test_paths_resolve_back() {
        for screen in [
            Screen::Setup,
            Screen::Scan,
            Screen::Results,
            Screen::FixInstructions,
            Screen::Report,
        ] {
            assert_eq!(Screen::from_path(screen.path()), screen);
        }
    }

    #[test]
    fn test_workflow_steps() {
        assert_eq!(Screen::Scan.workflow_step().unwrap().number, 2);
        assert_eq!(Screen::Report.workflow_step().unwrap().label, "Report");
        assert!(Screen::FixInstructions.workflow_step().is_none());
        assert!(Screen::NotFound.workflow_step().is_none());
    }

    #[test]
    fn test_contextual_actions() {
        let results = Screen::Results.chrome();
        let labels: Vec<_> = results.actions.iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["Generate Report", "Export Data", "View Technical Fixes"]);
        assert_eq!(
            results.actions[0].action,
            ContextualActionKind::Navigate(Screen::Report)
        );
        assert!(!results.technical_sidebar);

        assert_eq!(Screen::Scan.chrome().actions.len(), 1);
        assert!(Screen::Setup.chrome().actions.is_empty());
        assert!(Screen::FixInstructions.chrome().technical_sidebar);
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_value(Screen::Report.chrome()).unwrap();
        assert_eq!(json["screen"], "report");
        assert_eq!(json["workflow_step"]["number"], 4);
        assert_eq!(json["actions"][2]["action"], "navigate:/diagnostic-results-dashboard");
        assert_eq!(json["actions"][0]["action"], "download_report");
    }
}
