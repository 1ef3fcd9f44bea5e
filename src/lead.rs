//! Lead capture form: field rules, blur-time checks and submit-time checks.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").unwrap());

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Whitespace is ignored, so "+1 555 0100" is accepted.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_PATTERN.is_match(&compact)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum LeadField {
    FirstName,
    LastName,
    Email,
    Company,
    Role,
    Phone,
    MarketingConsent,
    PrivacyConsent,
}

impl LeadField {
    pub const ALL: [LeadField; 8] = [
        LeadField::FirstName,
        LeadField::LastName,
        LeadField::Email,
        LeadField::Company,
        LeadField::Role,
        LeadField::Phone,
        LeadField::MarketingConsent,
        LeadField::PrivacyConsent,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "Store Owner")]
    StoreOwner,
    #[serde(rename = "E-commerce Manager")]
    EcommerceManager,
    #[serde(rename = "Marketing Manager")]
    MarketingManager,
    #[serde(rename = "Developer")]
    Developer,
    #[serde(rename = "Agency Owner")]
    AgencyOwner,
    #[serde(rename = "Consultant")]
    Consultant,
    #[serde(rename = "Other")]
    Other,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::StoreOwner,
        Role::EcommerceManager,
        Role::MarketingManager,
        Role::Developer,
        Role::AgencyOwner,
        Role::Consultant,
        Role::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::StoreOwner => "Store Owner",
            Role::EcommerceManager => "E-commerce Manager",
            Role::MarketingManager => "Marketing Manager",
            Role::Developer => "Developer",
            Role::AgencyOwner => "Agency Owner",
            Role::Consultant => "Consultant",
            Role::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.label() == label)
    }
}

/// Raw form input, as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub phone: String,
    pub marketing_consent: bool,
    pub privacy_consent: bool,
}

/// A lead that passed every rule.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub role: Role,
    pub phone: Option<String>,
    pub marketing_consent: bool,
    pub privacy_consent: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<LeadField, String>);

impl FieldErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: LeadField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = LeadField> + '_ {
        self.0.keys().copied()
    }

    fn set(&mut self, field: LeadField, error: Option<&'static str>) {
        match error {
            Some(msg) => {
                self.0.insert(field, msg.to_string());
            }
            None => {
                self.0.remove(&field);
            }
        }
    }
}

fn min_length(value: &str, message: &'static str) -> Option<&'static str> {
    (value.trim().chars().count() < 2).then_some(message)
}

/// Rule for a single field against the current form values.
pub fn validate_field(field: LeadField, form: &LeadForm) -> Option<&'static str> {
    match field {
        LeadField::FirstName => {
            min_length(&form.first_name, "First name must be at least 2 characters")
        }
        LeadField::LastName => {
            min_length(&form.last_name, "Last name must be at least 2 characters")
        }
        LeadField::Company => {
            min_length(&form.company, "Company name must be at least 2 characters")
        }
        LeadField::Email => {
            (!is_valid_email(&form.email)).then_some("Please enter a valid email address")
        }
        LeadField::Role => Role::from_label(&form.role)
            .is_none()
            .then_some("Please select your role"),
        LeadField::Phone => (!form.phone.trim().is_empty() && !is_valid_phone(&form.phone))
            .then_some("Please enter a valid phone number"),
        LeadField::PrivacyConsent => (!form.privacy_consent)
            .then_some("You must accept the privacy policy to continue"),
        LeadField::MarketingConsent => None,
    }
}

pub fn validate_all(form: &LeadForm) -> FieldErrors {
    let mut errors = FieldErrors::default();
    for field in LeadField::ALL {
        errors.set(field, validate_field(field, form));
    }
    errors
}

impl LeadForm {
    /// Validate every field regardless of what was touched.
    pub fn submit(&self) -> Result<LeadRecord, FieldErrors> {
        let errors = validate_all(self);
        if !errors.is_empty() {
            return Err(errors);
        }
        // validate_all already rejected unknown roles
        let role = Role::from_label(&self.role).ok_or_else(|| {
            let mut e = FieldErrors::default();
            e.set(LeadField::Role, Some("Please select your role"));
            e
        })?;

        let phone = self.phone.trim();
        Ok(LeadRecord {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.clone(),
            company: self.company.trim().to_string(),
            role,
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            marketing_consent: self.marketing_consent,
            privacy_consent: self.privacy_consent,
        })
    }
}

/// A value typed into one field: text boxes and the role select take text,
/// the consent checkboxes take a flag.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadFormView {
    pub values: LeadForm,
    pub errors: FieldErrors,
}

/// Editing state of one form: values, errors and which fields were visited.
/// Errors are only shown for touched fields.
#[derive(Debug, Clone, Default)]
pub struct LeadFormState {
    pub form: LeadForm,
    errors: FieldErrors,
    touched: HashSet<LeadField>,
}

impl LeadFormState {
    /// Returns false for the consent checkboxes, which take a flag.
    pub fn set_text(&mut self, field: LeadField, value: impl Into<String>) -> bool {
        let value = value.into();
        match field {
            LeadField::FirstName => self.form.first_name = value,
            LeadField::LastName => self.form.last_name = value,
            LeadField::Email => self.form.email = value,
            LeadField::Company => self.form.company = value,
            LeadField::Role => self.form.role = value,
            LeadField::Phone => self.form.phone = value,
            LeadField::MarketingConsent | LeadField::PrivacyConsent => return false,
        }
        self.errors.set(field, None);
        true
    }

    /// Returns false for the text fields.
    pub fn set_flag(&mut self, field: LeadField, value: bool) -> bool {
        match field {
            LeadField::MarketingConsent => self.form.marketing_consent = value,
            LeadField::PrivacyConsent => self.form.privacy_consent = value,
            _ => return false,
        }
        self.errors.set(field, None);
        true
    }

    pub fn set(&mut self, field: LeadField, value: FieldValue) -> bool {
        match value {
            FieldValue::Text(text) => self.set_text(field, text),
            FieldValue::Flag(flag) => self.set_flag(field, flag),
        }
    }

    /// Take a whole form at once, as a direct submit does. Previous errors
    /// no longer describe these values.
    pub fn replace(&mut self, form: LeadForm) {
        self.form = form;
        self.errors = FieldErrors::default();
    }

    /// Validate just this field, as when it loses focus.
    pub fn blur(&mut self, field: LeadField) -> Option<&str> {
        self.touched.insert(field);
        self.errors.set(field, validate_field(field, &self.form));
        self.errors.get(field)
    }

    pub fn visible_error(&self, field: LeadField) -> Option<&str> {
        if self.touched.contains(&field) {
            self.errors.get(field)
        } else {
            None
        }
    }

    /// Errors of touched fields only.
    pub fn visible_errors(&self) -> FieldErrors {
        let mut visible = FieldErrors::default();
        for field in self.touched.iter().copied() {
            if let Some(msg) = self.errors.0.get(&field) {
                visible.0.insert(field, msg.clone());
            }
        }
        visible
    }

    pub fn view(&self) -> LeadFormView {
        LeadFormView {
            values: self.form.clone(),
            errors: self.visible_errors(),
        }
    }

    pub fn submit(&mut self) -> Result<LeadRecord, FieldErrors> {
        self.touched.extend(LeadField::ALL);
        match self.form.submit() {
            Ok(record) => {
                self.errors = FieldErrors::default();
                Ok(record)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> LeadForm {
        LeadForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            company: "Analytical Engines".to_string(),
            role: "Developer".to_string(),
            phone: String::new(),
            marketing_consent: false,
            privacy_consent: true,
        }
    }

    #[test]
    fn test_email_examples() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a.com"));
        assert!(!is_valid_email("a @b.co"));
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("+14155550100"));
        assert!(is_valid_phone("+1 415 555 0100"));
        assert!(is_valid_phone("7"));
        assert!(!is_valid_phone("0123"));
        assert!(!is_valid_phone("+1-415-555"));
        assert!(!is_valid_phone("12345678901234567"));
    }

    #[test]
    fn test_valid_form_submits() {
        let record = valid_form().submit().unwrap();
        assert_eq!(record.role, Role::Developer);
        assert!(record.phone.is_none());
        assert!(!record.marketing_consent);
    }

    #[test]
    fn test_short_names_rejected_after_trim() {
        let mut form = valid_form();
        form.first_name = " A ".to_string();
        form.company = "X".to_string();
        let errors = form.submit().unwrap_err();
        assert_eq!(
            errors.get(LeadField::FirstName),
            Some("First name must be at least 2 characters")
        );
        assert!(errors.get(LeadField::Company).is_some());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_role_must_come_from_list() {
        let mut form = valid_form();
        form.role = String::new();
        assert!(form.submit().unwrap_err().get(LeadField::Role).is_some());
        form.role = "Astronaut".to_string();
        assert!(form.submit().unwrap_err().get(LeadField::Role).is_some());
    }

    #[test]
    fn test_privacy_consent_blocks_marketing_does_not() {
        let mut form = valid_form();
        form.privacy_consent = false;
        let errors = form.submit().unwrap_err();
        assert!(errors.get(LeadField::PrivacyConsent).is_some());
        assert!(errors.get(LeadField::MarketingConsent).is_none());
    }

    #[test]
    fn test_optional_phone_validated_when_present() {
        let mut form = valid_form();
        form.phone = "abc".to_string();
        assert!(form.submit().unwrap_err().get(LeadField::Phone).is_some());
        form.phone = "+44 20 7946 0958".to_string();
        assert_eq!(form.submit().unwrap().phone.as_deref(), Some("+44 20 7946 0958"));
    }

    #[test]
    fn test_submit_reports_every_error() {
        let errors = LeadForm::default().submit().unwrap_err();
        let fields: Vec<LeadField> = errors.fields().collect();
        assert_eq!(
            fields,
            vec![
                LeadField::FirstName,
                LeadField::LastName,
                LeadField::Email,
                LeadField::Company,
                LeadField::Role,
                LeadField::PrivacyConsent,
            ]
        );
    }

    #[test]
    fn test_blur_validates_single_field() {
        let mut state = LeadFormState::default();
        state.set_text(LeadField::Email, "nope");
        assert!(state.blur(LeadField::Email).is_some());
        assert!(state.visible_error(LeadField::Email).is_some());
        // untouched fields stay quiet even though they are invalid
        assert!(state.visible_error(LeadField::FirstName).is_none());
    }

    #[test]
    fn test_editing_clears_field_error() {
        let mut state = LeadFormState::default();
        state.blur(LeadField::Company);
        assert!(state.visible_error(LeadField::Company).is_some());
        state.set_text(LeadField::Company, "Acme");
        assert!(state.visible_error(LeadField::Company).is_none());
    }

    #[test]
    fn test_state_submit_touches_everything() {
        let mut state = LeadFormState::default();
        assert!(state.submit().is_err());
        assert!(state.visible_error(LeadField::LastName).is_some());

        let mut state = LeadFormState::default();
        state.replace(valid_form());
        state.set_flag(LeadField::MarketingConsent, true);
        let record = state.submit().unwrap();
        assert!(record.marketing_consent);
    }

    #[test]
    fn test_set_rejects_mismatched_value_kind() {
        let mut state = LeadFormState::default();
        assert!(!state.set(LeadField::PrivacyConsent, FieldValue::Text("yes".into())));
        assert!(!state.set(LeadField::Email, FieldValue::Flag(true)));
        assert!(state.set(LeadField::PrivacyConsent, FieldValue::Flag(true)));
        assert!(state.form.privacy_consent);
    }

    #[test]
    fn test_visible_errors_only_cover_touched_fields() {
        let mut state = LeadFormState::default();
        state.blur(LeadField::Email);
        let visible = state.visible_errors();
        assert_eq!(visible.fields().collect::<Vec<_>>(), vec![LeadField::Email]);

        let json = serde_json::to_value(state.view()).unwrap();
        assert_eq!(json["errors"]["email"], "Please enter a valid email address");
        assert!(json["errors"].get("firstName").is_none());
    }

    #[test]
    fn test_field_value_deserializes_by_shape() {
        let flag: FieldValue = serde_json::from_str("true").unwrap();
        assert_eq!(flag, FieldValue::Flag(true));
        let text: FieldValue = serde_json::from_str("\"Ada\"").unwrap();
        assert_eq!(text, FieldValue::Text("Ada".to_string()));
    }

    #[test]
    fn test_field_errors_serialize_camel_case() {
        let errors = LeadForm::default().submit().unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert!(json.get("firstName").is_some());
        assert!(json.get("privacyConsent").is_some());
    }
}
