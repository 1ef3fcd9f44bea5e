//! Store URL field with a simulated reachability check.
//!
//! `idle → validating → valid | invalid`; any edit drops back to `idle` and
//! makes in-flight checks stale. A check only reports its verdict if it is
//! still the latest attempt, so every attempt notifies at most once.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::UNREACHABLE_STORE_MARKERS;

static SHOPIFY_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://.+\.myshopify\.com/?$").unwrap());

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UrlRejection {
    Format,
    NotFound,
}

impl UrlRejection {
    pub fn message(self) -> &'static str {
        match self {
            UrlRejection::Format => {
                "Please enter a valid Shopify store URL (e.g., https://your-store.myshopify.com)"
            }
            UrlRejection::NotFound => {
                "Store not found or not accessible. Please check the URL and try again."
            }
        }
    }
}

/// Format check followed by the simulated reachability check.
pub fn check_store_url(text: &str) -> Result<(), UrlRejection> {
    let trimmed = text.trim();
    if !SHOPIFY_URL_PATTERN.is_match(trimmed) {
        return Err(UrlRejection::Format);
    }
    if UNREACHABLE_STORE_MARKERS.iter().any(|m| trimmed.contains(m)) {
        return Err(UrlRejection::NotFound);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum UrlValidationState {
    Idle,
    Validating,
    Valid,
    Invalid(UrlRejection),
}

/// Token for one validation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationAttempt {
    pub attempt: u64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreUrlField {
    text: String,
    state: UrlValidationState,
    #[serde(skip)]
    attempt: u64,
}

impl Default for StoreUrlField {
    fn default() -> Self {
        Self {
            text: String::new(),
            state: UrlValidationState::Idle,
            attempt: 0,
        }
    }
}

impl StoreUrlField {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> UrlValidationState {
        self.state
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self.state {
            UrlValidationState::Invalid(reason) => Some(reason.message()),
            _ => None,
        }
    }

    /// New text invalidates whatever verdict (or pending check) came before.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.state = UrlValidationState::Idle;
        self.attempt += 1;
    }

    /// Start a check. `None` when the field is blank or a check is running.
    pub fn blur(&mut self) -> Option<ValidationAttempt> {
        if self.text.trim().is_empty() {
            self.state = UrlValidationState::Idle;
            return None;
        }
        if self.state == UrlValidationState::Validating {
            return None;
        }
        self.attempt += 1;
        self.state = UrlValidationState::Validating;
        Some(ValidationAttempt {
            attempt: self.attempt,
            text: self.text.clone(),
        })
    }

    /// Apply a verdict. Returns `Some(is_valid)` exactly once for the
    /// current attempt and `None` for stale or repeated verdicts.
    pub fn resolve(
        &mut self,
        attempt: &ValidationAttempt,
        verdict: Result<(), UrlRejection>,
    ) -> Option<bool> {
        if attempt.attempt != self.attempt || self.state != UrlValidationState::Validating {
            return None;
        }
        self.state = match verdict {
            Ok(()) => UrlValidationState::Valid,
            Err(reason) => UrlValidationState::Invalid(reason),
        };
        Some(verdict.is_ok())
    }
}

/// The simulated round trip: wait, then check.
pub async fn run_check(attempt: &ValidationAttempt, delay: Duration) -> Result<(), UrlRejection> {
    sleep(delay).await;
    check_store_url(&attempt.text)
}

/// Host part of a store URL, for display.
pub fn store_host(text: &str) -> Option<String> {
    url::Url::parse(text.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_examples() {
        assert_eq!(check_store_url("https://my-shop.myshopify.com"), Ok(()));
        assert_eq!(
            check_store_url("https://invalid.myshopify.com"),
            Err(UrlRejection::NotFound)
        );
        assert_eq!(
            check_store_url("ftp://x.myshopify.com"),
            Err(UrlRejection::Format)
        );
    }

    #[test]
    fn test_check_accepts_trailing_slash_and_case() {
        assert_eq!(check_store_url("HTTP://Shop.MyShopify.com/"), Ok(()));
        assert_eq!(
            check_store_url("https://shop.example.com"),
            Err(UrlRejection::Format)
        );
        assert_eq!(
            check_store_url("https://test-fail-shop.myshopify.com"),
            Err(UrlRejection::NotFound)
        );
    }

    #[test]
    fn test_blank_blur_stays_idle() {
        let mut field = StoreUrlField::default();
        field.edit("   ");
        assert!(field.blur().is_none());
        assert_eq!(field.state(), UrlValidationState::Idle);
    }

    #[test]
    fn test_resolve_notifies_once() {
        let mut field = StoreUrlField::default();
        field.edit("https://my-shop.myshopify.com");
        let attempt = field.blur().unwrap();
        assert_eq!(field.state(), UrlValidationState::Validating);
        assert!(field.blur().is_none());

        assert_eq!(field.resolve(&attempt, Ok(())), Some(true));
        assert_eq!(field.resolve(&attempt, Ok(())), None);
        assert_eq!(field.state(), UrlValidationState::Valid);
    }

    #[test]
    fn test_edit_makes_pending_check_stale() {
        let mut field = StoreUrlField::default();
        field.edit("https://my-shop.myshopify.com");
        let attempt = field.blur().unwrap();
        field.edit("https://other.myshopify.com");
        assert_eq!(field.resolve(&attempt, Ok(())), None);
        assert_eq!(field.state(), UrlValidationState::Idle);
    }

    #[test]
    fn test_revalidate_after_verdict() {
        let mut field = StoreUrlField::default();
        field.edit("ftp://x.myshopify.com");
        let first = field.blur().unwrap();
        assert_eq!(field.resolve(&first, Err(UrlRejection::Format)), Some(false));
        assert!(field.error_message().is_some());

        let second = field.blur().unwrap();
        assert_ne!(first.attempt, second.attempt);
        assert_eq!(field.resolve(&first, Ok(())), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_check_waits_then_checks() {
        let attempt = ValidationAttempt {
            attempt: 1,
            text: "https://invalid.myshopify.com".to_string(),
        };
        let start = tokio::time::Instant::now();
        let verdict = run_check(&attempt, Duration::from_millis(1000)).await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(verdict, Err(UrlRejection::NotFound));
    }

    #[test]
    fn test_store_host() {
        assert_eq!(
            store_host("https://my-shop.myshopify.com/").as_deref(),
            Some("my-shop.myshopify.com")
        );
        assert!(store_host("not a url").is_none());
    }
}
