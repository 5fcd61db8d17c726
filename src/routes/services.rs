/**
 * Service Routes
 * Generic (non-city) service listing and detail pages.
 */
use axum::{extract::Path, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::content::{self, ComposedContent};
use crate::context::{self, CommonContext};
use crate::db::{self, models::Service};
use crate::error::AppError;
use crate::resolve;
use crate::seo;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCard {
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub icon_path: String,
    pub features: sqlx::types::Json<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesPayload {
    pub page_title: String,
    pub meta_description: String,
    pub services: Vec<ServiceCard>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetailPayload {
    pub page_title: String,
    pub meta_description: String,
    pub slug: String,
    pub content: ComposedContent,
    pub nav: CommonContext,
}

pub async fn active_services(pool: &PgPool) -> Result<Vec<ServiceCard>, sqlx::Error> {
    sqlx::query_as::<_, ServiceCard>(
        r#"
        SELECT title, slug, short_description, icon_path, features
        FROM services
        WHERE is_active = true
        ORDER BY display_order, title
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Detail payload for a generic (no city customization) service page.
pub async fn service_detail_payload(
    pool: &PgPool,
    service: Service,
) -> Result<ServiceDetailPayload, AppError> {
    let content = content::compose(&service, None, None);
    let nav = context::common_context(pool).await?;

    Ok(ServiceDetailPayload {
        page_title: content.meta_title.clone(),
        meta_description: content.meta_description.clone(),
        slug: service.slug,
        content,
        nav,
    })
}

/// GET /services - all active services
pub async fn list_services() -> Result<Json<ServicesPayload>, AppError> {
    let pool = db::pool()?;

    let services = active_services(&pool).await?;
    let nav = context::common_context(&pool).await?;

    Ok(Json(ServicesPayload {
        page_title: format!("Our Services - {}", seo::site_name()),
        meta_description:
            "Explore our wide range of technology services including software development, \
             CRM, HRMS, and more."
                .to_string(),
        services,
        nav,
    }))
}

/// GET /services/{slug} - single service detail
pub async fn service_detail(
    Path(slug): Path<String>,
) -> Result<Json<ServiceDetailPayload>, AppError> {
    let pool = db::pool()?;

    let service = resolve::active_service_by_slug(&pool, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(service_detail_payload(&pool, service).await?))
}
