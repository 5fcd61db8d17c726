/**
 * Resource Routes
 * Gated downloads: listing plus the claim endpoint that captures a lead
 * according to each resource's requirement flags before releasing the file.
 */
use axum::{
    extract::{Form, Path},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{self, CommonContext};
use crate::db::{
    self,
    models::{Interest, LeadSource, ResourceDownload},
};
use crate::error::AppError;
use crate::intake::{self, FieldErrors, NewLead};
use crate::seo;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesPayload {
    pub page_title: String,
    pub meta_description: String,
    pub resources: Vec<ResourceDownload>,
    pub nav: CommonContext,
}

/// Claim form body. Which fields are required depends on the resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub file: String,
    pub download_count: i64,
}

/// Validate a claim against the resource's requirement flags.
pub fn validate_claim(resource: &ResourceDownload, payload: &ClaimPayload) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    let missing = |value: &Option<String>| value.as_deref().map(str::trim).unwrap_or("").is_empty();

    if resource.require_name && missing(&payload.name) {
        errors.add("name", "Please enter your name");
    }
    if resource.require_email && missing(&payload.email) {
        errors.add("email", "Please enter your email address");
    }
    if resource.require_phone && missing(&payload.phone) {
        errors.add("phone", "Please enter your phone number");
    }
    if resource.require_company && missing(&payload.company) {
        errors.add("company", "Please enter your company name");
    }

    // An email, required or not, must at least look like one.
    if let Some(email) = payload.email.as_deref().map(str::trim) {
        if !email.is_empty() && !intake::is_valid_email(email) {
            errors.add("email", "Please enter a valid email address");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// GET /resources - downloadable resources
pub async fn list_resources() -> Result<Json<ResourcesPayload>, AppError> {
    let pool = db::pool()?;

    let resources = sqlx::query_as::<_, ResourceDownload>(
        r#"
        SELECT id, title, resource_type, file_path, description, service_id,
               require_name, require_email, require_phone, require_company,
               download_count, created_at, updated_at
        FROM resource_downloads
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.as_ref())
    .await?;

    let nav = context::common_context(&pool).await?;

    Ok(Json(ResourcesPayload {
        page_title: format!("Resources - {}", seo::site_name()),
        meta_description: "Guides, whitepapers, and templates from our team.".to_string(),
        resources,
        nav,
    }))
}

/// POST /resources/{id}/download - claim a resource.
///
/// Captures a lead (source: download) when the claim passes the resource's
/// requirement flags, bumps the download counter, and returns the file
/// reference.
pub async fn claim_download(
    Path(id): Path<Uuid>,
    Form(payload): Form<ClaimPayload>,
) -> Result<Response, AppError> {
    let pool = db::pool()?;

    let resource = sqlx::query_as::<_, ResourceDownload>(
        r#"
        SELECT id, title, resource_type, file_path, description, service_id,
               require_name, require_email, require_phone, require_company,
               download_count, created_at, updated_at
        FROM resource_downloads
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await?
    .ok_or(AppError::NotFound)?;

    if let Err(errors) = validate_claim(&resource, &payload) {
        return Ok(errors.into_response_with(&payload));
    }

    // Interest follows the related service's slug when there is one.
    let interest = match resource.service_id {
        Some(service_id) => {
            sqlx::query_scalar::<_, String>("SELECT slug FROM services WHERE id = $1")
                .bind(service_id)
                .fetch_optional(pool.as_ref())
                .await?
                .map(|slug| intake::interest_for_service(&slug))
                .unwrap_or(Interest::Other)
        }
        None => Interest::Other,
    };

    // A claim with no contact fields at all (all flags off) records nothing.
    let has_contact = payload.name.is_some() || payload.email.is_some();
    if has_contact {
        let lead = NewLead {
            name: payload.name.clone().unwrap_or_default(),
            email: payload.email.clone().unwrap_or_default(),
            phone: payload.phone.clone(),
            company: payload.company.clone(),
            job_title: None,
            city_id: None,
            interest,
            service_id: resource.service_id,
            message: Some(format!("Downloaded: {}", resource.title)),
            source: LeadSource::Download,
        };
        intake::create_lead(&pool, lead).await?;
    }

    let download_count = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE resource_downloads
        SET download_count = download_count + 1, updated_at = now()
        WHERE id = $1
        RETURNING download_count
        "#,
    )
    .bind(resource.id)
    .fetch_one(pool.as_ref())
    .await?;

    Ok(Json(ClaimResponse {
        file: resource.file_path,
        download_count,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn resource(flags: (bool, bool, bool, bool)) -> ResourceDownload {
        ResourceDownload {
            id: Uuid::new_v4(),
            title: "CRM Buyer's Guide".into(),
            resource_type: "guide".into(),
            file_path: "resources/crm-guide.pdf".into(),
            description: "How to pick a CRM.".into(),
            service_id: None,
            require_name: flags.0,
            require_email: flags.1,
            require_phone: flags.2,
            require_company: flags.3,
            download_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_claim_respects_requirement_flags() {
        let resource = resource((true, true, false, false));
        let errors = validate_claim(&resource, &ClaimPayload::default()).unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_none());
        assert!(errors.get("company").is_none());
    }

    #[test]
    fn test_claim_with_no_flags_passes_empty() {
        let resource = resource((false, false, false, false));
        assert!(validate_claim(&resource, &ClaimPayload::default()).is_ok());
    }

    #[test]
    fn test_claim_checks_email_format_even_when_optional() {
        let resource = resource((false, false, false, false));
        let payload = ClaimPayload {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        let errors = validate_claim(&resource, &payload).unwrap_err();
        assert!(errors.get("email").is_some());
    }
}
