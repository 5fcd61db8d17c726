/**
 * Contact Routes
 * Lead generation form: payload for the form page, submission handling, and
 * the post-submit success page.
 */
use axum::{
    extract::Form,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::context::{self, CommonContext};
use crate::db::{
    self,
    models::{Interest, LeadSource},
};
use crate::error::AppError;
use crate::intake::{self, ContactPayload, NewLead};
use crate::seo;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// The closed interest list the renderer shows in the form select.
pub fn interest_options() -> Vec<InterestOption> {
    Interest::ALL
        .iter()
        .map(|i| InterestOption {
            value: i.as_str(),
            label: i.label(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormPayload {
    pub page_title: String,
    pub meta_description: String,
    pub interests: Vec<InterestOption>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSuccessPayload {
    pub page_title: String,
    pub meta_description: String,
}

/// GET /contact - contact page payload
pub async fn contact_form() -> Result<Json<ContactFormPayload>, AppError> {
    let pool = db::pool()?;
    let nav = context::common_context(&pool).await?;

    Ok(Json(ContactFormPayload {
        page_title: format!("Contact Us - {}", seo::site_name()),
        meta_description: format!(
            "Get in touch with {} for all your technology needs.",
            seo::site_name()
        ),
        interests: interest_options(),
        nav,
    }))
}

/// POST /contact - create a lead from the main contact form.
///
/// The lead save is authoritative and happens first; the optional newsletter
/// signup is an independent second write whose outcome never changes the
/// response.
pub async fn submit_contact(Form(payload): Form<ContactPayload>) -> Result<Response, AppError> {
    let pool = db::pool()?;

    if let Err(errors) = intake::validate_contact(&payload) {
        return Ok(errors.into_response_with(&payload));
    }

    let lead = intake::create_lead(&pool, NewLead::from_contact(&payload, LeadSource::ContactForm))
        .await?;

    tracing::info!(lead_id = %lead.id, source = %lead.source, "lead created");

    if payload.wants_newsletter() {
        intake::subscribe_best_effort(&pool, &lead.email, Some(&lead.name), None).await;
    }

    Ok(Redirect::to("/contact/success").into_response())
}

/// GET /contact/success - submission confirmation payload
pub async fn contact_success() -> Json<ContactSuccessPayload> {
    Json(ContactSuccessPayload {
        page_title: format!("Message Sent - {}", seo::site_name()),
        meta_description: format!(
            "Your message has been successfully sent to {}.",
            seo::site_name()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_options_cover_the_closed_set() {
        let options = interest_options();
        assert_eq!(options.len(), Interest::ALL.len());
        assert!(options.iter().any(|o| o.value == "crm"));
        assert!(options.iter().any(|o| o.value == "other"));
    }
}
