/**
 * API Routes
 * JSON projections of active cities, services, and city-service pages for
 * client-side consumption.
 */
use axum::{extract::Path, Json};
use serde::Serialize;

use crate::context::city_service_url;
use crate::db;
use crate::error::AppError;
use crate::resolve;

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CityProjection {
    pub name: String,
    pub slug: String,
    pub state: String,
    #[sqlx(skip)]
    pub url: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProjection {
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub icon_path: String,
    #[sqlx(skip)]
    pub url: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CityServiceProjection {
    pub service_title: String,
    pub service_slug: String,
    pub customized: bool,
    #[sqlx(skip)]
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityServicesResponse {
    pub city: CityProjection,
    pub services: Vec<CityServiceProjection>,
}

/// GET /api/cities - active cities
pub async fn api_cities() -> Result<Json<Vec<CityProjection>>, AppError> {
    let pool = db::pool()?;

    let mut cities = sqlx::query_as::<_, CityProjection>(
        "SELECT name, slug, state FROM cities WHERE is_active = true ORDER BY name",
    )
    .fetch_all(pool.as_ref())
    .await?;

    for city in &mut cities {
        city.url = format!("/{}", city.slug);
    }

    Ok(Json(cities))
}

/// GET /api/services - active services
pub async fn api_services() -> Result<Json<Vec<ServiceProjection>>, AppError> {
    let pool = db::pool()?;

    let mut services = sqlx::query_as::<_, ServiceProjection>(
        r#"
        SELECT title, slug, short_description, icon_path
        FROM services
        WHERE is_active = true
        ORDER BY display_order, title
        "#,
    )
    .fetch_all(pool.as_ref())
    .await?;

    for service in &mut services {
        service.url = format!("/services/{}", service.slug);
    }

    Ok(Json(services))
}

/// GET /api/city/{city_slug}/services - a city's active service pages.
/// Unknown or inactive city slugs produce a JSON not-found body.
pub async fn api_city_services(
    Path(city_slug): Path<String>,
) -> Result<Json<CityServicesResponse>, AppError> {
    let pool = db::pool()?;

    let city = resolve::active_city_by_slug(&pool, &city_slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut services = sqlx::query_as::<_, CityServiceProjection>(
        r#"
        SELECT s.title AS service_title, s.slug AS service_slug,
               (cs.custom_content <> '') AS customized
        FROM city_services cs
        JOIN services s ON s.id = cs.service_id
        WHERE cs.city_id = $1 AND cs.is_active = true AND s.is_active = true
        ORDER BY s.display_order, s.title
        "#,
    )
    .bind(city.id)
    .fetch_all(pool.as_ref())
    .await?;

    for service in &mut services {
        service.url = city_service_url(&service.service_slug, &city.slug);
    }

    Ok(Json(CityServicesResponse {
        city: CityProjection {
            url: format!("/{}", city.slug),
            name: city.name,
            slug: city.slug,
            state: city.state,
        },
        services,
    }))
}
