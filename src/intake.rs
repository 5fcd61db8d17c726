//! Lead/Subscriber Intake.
//!
//! Validates submitted form payloads and persists them. Validation failures
//! carry field-level messages and echo the original input back so the
//! renderer can re-display the form; nothing is persisted on failure.
//! Duplicate newsletter submissions are converted to an indistinguishable
//! success so the endpoint never reveals whether an address was already
//! subscribed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::db::models::{Interest, Lead, LeadSource};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_COMPANY_LEN: usize = 100;
pub const MAX_JOB_TITLE_LEN: usize = 100;
pub const MAX_MESSAGE_LEN: usize = 5000;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(email)
}

// ============================================================================
// Field-level validation errors
// ============================================================================

/// Per-field validation messages, keyed by the form field name.
#[derive(Debug, Default, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// 422 response with the field messages and the echoed input.
    pub fn into_response_with<T: Serialize>(self, values: &T) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "errors": self.0,
                "values": values,
            })),
        )
            .into_response()
    }
}

fn check_required(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn check_max_len(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Must be at most {} characters", max));
    }
}

fn check_optional_max_len(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &Option<String>,
    max: usize,
) {
    if let Some(value) = value {
        check_max_len(errors, field, value, max);
    }
}

// ============================================================================
// Form payloads
// ============================================================================

/// Contact form body (form-encoded). The `newsletter` checkbox arrives as
/// whatever the renderer sends for a checked box.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub interest: Option<String>,
    #[serde(default)]
    pub message: String,
    pub newsletter: Option<String>,
}

impl ContactPayload {
    pub fn wants_newsletter(&self) -> bool {
        matches!(
            self.newsletter.as_deref().map(str::to_lowercase).as_deref(),
            Some("on") | Some("true") | Some("1") | Some("yes")
        )
    }
}

/// Newsletter signup body (form-encoded).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsletterPayload {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
}

pub fn validate_contact(payload: &ContactPayload) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    check_required(&mut errors, "name", &payload.name, "Please enter your name");
    check_max_len(&mut errors, "name", &payload.name, MAX_NAME_LEN);

    check_required(
        &mut errors,
        "email",
        &payload.email,
        "Please enter your email address",
    );
    if !payload.email.trim().is_empty() && !is_valid_email(payload.email.trim()) {
        errors.add("email", "Please enter a valid email address");
    }

    check_optional_max_len(&mut errors, "phone", &payload.phone, MAX_PHONE_LEN);
    check_optional_max_len(&mut errors, "company", &payload.company, MAX_COMPANY_LEN);
    check_optional_max_len(
        &mut errors,
        "job_title",
        &payload.job_title,
        MAX_JOB_TITLE_LEN,
    );

    if let Some(interest) = payload.interest.as_deref() {
        if !interest.is_empty() && Interest::parse(interest).is_none() {
            errors.add("interest", "Please select a valid option");
        }
    }

    check_required(
        &mut errors,
        "message",
        &payload.message,
        "Please enter a message",
    );
    check_max_len(&mut errors, "message", &payload.message, MAX_MESSAGE_LEN);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_newsletter(payload: &NewsletterPayload) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    check_required(
        &mut errors,
        "email",
        &payload.email,
        "Please enter your email address",
    );
    if !payload.email.trim().is_empty() && !is_valid_email(payload.email.trim()) {
        errors.add("email", "Please enter a valid email address");
    }
    check_optional_max_len(&mut errors, "name", &payload.name, MAX_NAME_LEN);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// A validated lead ready to persist. `source` is always stamped by the call
/// site, never taken from the payload.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub city_id: Option<Uuid>,
    pub interest: Interest,
    pub service_id: Option<Uuid>,
    pub message: Option<String>,
    pub source: LeadSource,
}

impl NewLead {
    pub fn from_contact(payload: &ContactPayload, source: LeadSource) -> Self {
        let interest = payload
            .interest
            .as_deref()
            .and_then(Interest::parse)
            .unwrap_or(Interest::Other);
        NewLead {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            phone: trimmed(&payload.phone),
            company: trimmed(&payload.company),
            job_title: trimmed(&payload.job_title),
            city_id: None,
            interest,
            service_id: None,
            message: Some(payload.message.trim().to_string()),
            source,
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// An "interest" is derived from a service slug only on an exact match
/// against the closed enumeration; anything else is Other.
pub fn interest_for_service(service_slug: &str) -> Interest {
    Interest::parse(service_slug).unwrap_or(Interest::Other)
}

pub async fn create_lead(pool: &PgPool, lead: NewLead) -> Result<Lead, sqlx::Error> {
    sqlx::query_as::<_, Lead>(
        r#"
        INSERT INTO leads (name, email, phone, company, job_title, city_id,
                           interest, service_id, message, source, status,
                           created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'new', now(), now())
        RETURNING id, name, email, phone, company, job_title, city_id, interest,
                  service_id, message, source, status, notes, created_at, updated_at
        "#,
    )
    .bind(&lead.name)
    .bind(&lead.email)
    .bind(&lead.phone)
    .bind(&lead.company)
    .bind(&lead.job_title)
    .bind(lead.city_id)
    .bind(lead.interest.as_str())
    .bind(lead.service_id)
    .bind(&lead.message)
    .bind(lead.source.as_str())
    .fetch_one(pool)
    .await
}

/// Insert a newsletter subscriber. A unique-violation on the email column is
/// swallowed into `Ok(false)` - the caller must respond exactly as it would
/// for a first-time signup. Any other store failure propagates.
pub async fn subscribe(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    city_id: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO newsletter_subscribers (email, name, city_id, is_active, created_at)
        VALUES ($1, $2, $3, true, now())
        "#,
    )
    .bind(email.trim())
    .bind(name.map(str::trim))
    .bind(city_id)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::debug!(email = %email, "duplicate newsletter signup treated as success");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Secondary newsletter write attached to a lead submission. Its outcome must
/// never affect the primary lead save, so every failure is logged and dropped.
pub async fn subscribe_best_effort(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    city_id: Option<Uuid>,
) {
    if let Err(e) = subscribe(pool, email, name, city_id).await {
        tracing::warn!("newsletter subscription alongside lead failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_contact() -> ContactPayload {
        ContactPayload {
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            message: "Tell me more about CRM.".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_contact_passes() {
        assert!(validate_contact(&valid_contact()).is_ok());
    }

    #[test]
    fn test_contact_requires_name_email_message() {
        let errors = validate_contact(&ContactPayload::default()).unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("message").is_some());
    }

    #[test]
    fn test_contact_rejects_malformed_email() {
        let mut payload = valid_contact();
        payload.email = "not-an-email".into();
        let errors = validate_contact(&payload).unwrap_err();
        assert_eq!(
            errors.get("email"),
            Some("Please enter a valid email address")
        );
    }

    #[test]
    fn test_contact_rejects_unknown_interest_token() {
        let mut payload = valid_contact();
        payload.interest = Some("blockchain".into());
        let errors = validate_contact(&payload).unwrap_err();
        assert!(errors.get("interest").is_some());
    }

    #[test]
    fn test_contact_accepts_known_interest_token() {
        let mut payload = valid_contact();
        payload.interest = Some("crm".into());
        assert!(validate_contact(&payload).is_ok());
    }

    #[test]
    fn test_contact_enforces_field_lengths() {
        let mut payload = valid_contact();
        payload.name = "x".repeat(MAX_NAME_LEN + 1);
        payload.phone = Some("9".repeat(MAX_PHONE_LEN + 1));
        let errors = validate_contact(&payload).unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("phone").is_some());
    }

    #[test]
    fn test_newsletter_requires_valid_email() {
        let errors = validate_newsletter(&NewsletterPayload::default()).unwrap_err();
        assert!(errors.get("email").is_some());

        let payload = NewsletterPayload {
            email: "someone@example.com".into(),
            name: None,
        };
        assert!(validate_newsletter(&payload).is_ok());
    }

    #[test]
    fn test_wants_newsletter_checkbox_values() {
        let mut payload = valid_contact();
        assert!(!payload.wants_newsletter());
        for value in ["on", "true", "1", "yes", "ON"] {
            payload.newsletter = Some(value.into());
            assert!(payload.wants_newsletter(), "value {:?}", value);
        }
        payload.newsletter = Some("off".into());
        assert!(!payload.wants_newsletter());
    }

    #[test]
    fn test_interest_for_service_exact_match_only() {
        assert_eq!(interest_for_service("crm"), Interest::Crm);
        assert_eq!(interest_for_service("voip"), Interest::Voip);
        // Real service slugs rarely coincide with interest tokens.
        assert_eq!(interest_for_service("crm-solutions"), Interest::Other);
        assert_eq!(interest_for_service(""), Interest::Other);
    }

    #[test]
    fn test_new_lead_from_contact_defaults_interest_to_other() {
        let lead = NewLead::from_contact(&valid_contact(), LeadSource::ContactForm);
        assert_eq!(lead.interest, Interest::Other);
        assert_eq!(lead.source, LeadSource::ContactForm);
        assert!(lead.phone.is_none());
    }

    #[test]
    fn test_new_lead_trims_optional_fields() {
        let mut payload = valid_contact();
        payload.phone = Some("  ".into());
        payload.company = Some(" Acme Ltd ".into());
        let lead = NewLead::from_contact(&payload, LeadSource::CityPage);
        assert!(lead.phone.is_none());
        assert_eq!(lead.company.as_deref(), Some("Acme Ltd"));
    }
}
