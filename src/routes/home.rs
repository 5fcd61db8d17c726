/**
 * Home Route
 * Homepage payload: active services and cities plus featured-or-recent posts.
 */
use axum::Json;
use serde::Serialize;

use crate::context::{self, CommonContext};
use crate::db::{self, models::City};
use crate::error::AppError;
use crate::routes::blog::{self, PostCard};
use crate::routes::services::{active_services, ServiceCard};
use crate::seo;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePayload {
    pub page_title: String,
    pub meta_description: String,
    pub services: Vec<ServiceCard>,
    pub cities: Vec<City>,
    pub latest_posts: Vec<PostCard>,
    pub nav: CommonContext,
}

pub async fn active_cities(pool: &sqlx::PgPool) -> Result<Vec<City>, sqlx::Error> {
    sqlx::query_as::<_, City>(
        r#"
        SELECT id, name, slug, state, is_active, meta_title, meta_description, featured_image
        FROM cities
        WHERE is_active = true
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// GET / - homepage payload
pub async fn home() -> Result<Json<HomePayload>, AppError> {
    let pool = db::pool()?;

    let services = active_services(&pool).await?;
    let cities = active_cities(&pool).await?;
    let latest_posts = blog::featured_or_recent(&pool, 3).await?;
    let nav = context::common_context(&pool).await?;

    Ok(Json(HomePayload {
        page_title: format!("{} - Innovative Technology Services", seo::site_name()),
        meta_description:
            "Leading provider of technology solutions including software development, CRM, \
             HRMS, VOIP, API, and more."
                .to_string(),
        services,
        cities,
        latest_posts,
        nav,
    }))
}
