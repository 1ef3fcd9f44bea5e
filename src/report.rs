//! Report customization, delivery choice and the downloadable artifact.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::config::{REPORT_FILE_PREFIX, REPORT_MEDIA_TYPE};
use crate::lead::{is_valid_email, LeadRecord};
use crate::progress::StageDefinition;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSection {
    pub id: String,
    pub title: String,
    pub description: String,
    pub required: bool,
    /// Part of a fresh selection.
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFixture {
    pub sections: Vec<ReportSection>,
    pub generation_stages: Vec<StageDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
    #[error("Unknown report section: {0}")]
    Unknown(String),
    #[error("Section '{0}' is always included")]
    Required(String),
}

/// Which sections go into the report, in selection order.
#[derive(Debug, Clone)]
pub struct SectionSelection {
    sections: Vec<ReportSection>,
    selected: Vec<String>,
}

impl SectionSelection {
    pub fn new(sections: Vec<ReportSection>) -> Self {
        let selected = sections
            .iter()
            .filter(|s| s.selected || s.required)
            .map(|s| s.id.clone())
            .collect();
        Self { sections, selected }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, section_id: &str) -> bool {
        self.selected.iter().any(|id| id == section_id)
    }

    /// Returns the new selected flag. Required sections cannot be removed.
    pub fn toggle(&mut self, section_id: &str) -> Result<bool, SectionError> {
        let section = self
            .sections
            .iter()
            .find(|s| s.id == section_id)
            .ok_or_else(|| SectionError::Unknown(section_id.to_string()))?;

        if let Some(pos) = self.selected.iter().position(|id| id == section_id) {
            if section.required {
                return Err(SectionError::Required(section_id.to_string()));
            }
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(section_id.to_string());
            Ok(true)
        }
    }

    /// Selected sections with their metadata, in catalog order.
    pub fn selected_sections(&self) -> Vec<&ReportSection> {
        self.sections
            .iter()
            .filter(|s| self.is_selected(&s.id))
            .collect()
    }

    pub fn view(&self) -> Vec<SectionView> {
        self.sections
            .iter()
            .map(|s| SectionView {
                id: s.id.clone(),
                title: s.title.clone(),
                description: s.description.clone(),
                required: s.required,
                selected: self.is_selected(&s.id),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub required: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Download,
    Email,
    Both,
}

impl DeliveryMethod {
    pub fn downloads(self) -> bool {
        matches!(self, DeliveryMethod::Download | DeliveryMethod::Both)
    }

    pub fn emails(self) -> bool {
        matches!(self, DeliveryMethod::Email | DeliveryMethod::Both)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Delivery {
    pub method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Delivery {
    /// `email` needs an address of its own; `both` falls back to the lead's.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self.email.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() && !is_valid_email(addr) => {
                Err("Please enter a valid email address")
            }
            None | Some("") if self.method == DeliveryMethod::Email => {
                Err("Please enter a valid email address")
            }
            _ => Ok(()),
        }
    }

    /// Where the report goes, if it is emailed at all.
    pub fn recipient<'a>(&'a self, lead: &'a LeadRecord) -> Option<&'a str> {
        if !self.method.emails() {
            return None;
        }
        match self.email.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() => Some(addr),
            _ => Some(lead.email.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Bytes,
}

impl ReportArtifact {
    /// Placeholder document; no real PDF is rendered.
    pub fn render(
        lead: &LeadRecord,
        store_url: &str,
        sections: &[&ReportSection],
        generated_at_ms: i64,
    ) -> Self {
        let mut body = String::from("Mock PDF content\n");
        body.push_str(&format!("Store: {store_url}\n"));
        body.push_str(&format!(
            "Prepared for: {} {} ({})\n",
            lead.first_name, lead.last_name, lead.company
        ));
        for section in sections {
            body.push_str(&format!("- {}\n", section.title));
        }

        Self {
            file_name: format!("{REPORT_FILE_PREFIX}{generated_at_ms}.pdf"),
            media_type: REPORT_MEDIA_TYPE,
            bytes: Bytes::from(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::Role;

    fn section(id: &str, required: bool, selected: bool) -> ReportSection {
        ReportSection {
            id: id.to_string(),
            title: format!("{id} title"),
            description: String::new(),
            required,
            selected,
        }
    }

    fn sections() -> Vec<ReportSection> {
        vec![
            section("executive-summary", true, true),
            section("technical-details", false, true),
            section("best-practices", false, false),
        ]
    }

    fn lead() -> LeadRecord {
        LeadRecord {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            company: "Engines Ltd".to_string(),
            role: Role::Developer,
            phone: None,
            marketing_consent: false,
            privacy_consent: true,
        }
    }

    #[test]
    fn test_default_selection() {
        let selection = SectionSelection::new(sections());
        assert_eq!(selection.selected(), ["executive-summary", "technical-details"]);
    }

    #[test]
    fn test_toggle_rules() {
        let mut selection = SectionSelection::new(sections());
        assert_eq!(selection.toggle("best-practices"), Ok(true));
        assert_eq!(selection.toggle("technical-details"), Ok(false));
        assert_eq!(
            selection.toggle("executive-summary"),
            Err(SectionError::Required("executive-summary".to_string()))
        );
        assert!(matches!(selection.toggle("nope"), Err(SectionError::Unknown(_))));

        let ids: Vec<_> = selection.selected_sections().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["executive-summary", "best-practices"]);
    }

    #[test]
    fn test_delivery_validation() {
        let download = Delivery::default();
        assert!(download.validate().is_ok());

        let email_missing = Delivery {
            method: DeliveryMethod::Email,
            email: None,
        };
        assert!(email_missing.validate().is_err());

        let both_fallback = Delivery {
            method: DeliveryMethod::Both,
            email: None,
        };
        assert!(both_fallback.validate().is_ok());
        assert_eq!(both_fallback.recipient(&lead()), Some("ada@example.com"));

        let bad = Delivery {
            method: DeliveryMethod::Both,
            email: Some("a@b".to_string()),
        };
        assert!(bad.validate().is_err());

        assert_eq!(download.recipient(&lead()), None);
    }

    #[test]
    fn test_artifact_name_and_type() {
        let sections = sections();
        let picked: Vec<&ReportSection> = sections.iter().collect();
        let artifact =
            ReportArtifact::render(&lead(), "shop.myshopify.com", &picked, 1_700_000_000_123);
        assert_eq!(artifact.file_name, "klaviyo-diagnostic-report-1700000000123.pdf");
        assert_eq!(artifact.media_type, "application/pdf");
        let text = String::from_utf8(artifact.bytes.to_vec()).unwrap();
        assert!(text.contains("technical-details title"));
        assert!(text.contains("Engines Ltd"));
    }
}
