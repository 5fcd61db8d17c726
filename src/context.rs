//! Common navigation context included in every page payload: the active
//! cities and services the renderer needs for menus and footers.

use serde::Serialize;
use sqlx::PgPool;

use crate::resolve::COMPOSITE_SEPARATOR;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CityNav {
    pub name: String,
    pub slug: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNav {
    pub title: String,
    pub slug: String,
    pub icon_path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonContext {
    pub cities: Vec<CityNav>,
    pub services: Vec<ServiceNav>,
}

pub async fn common_context(pool: &PgPool) -> Result<CommonContext, sqlx::Error> {
    let cities = sqlx::query_as::<_, CityNav>(
        "SELECT name, slug, state FROM cities WHERE is_active = true ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    let services = sqlx::query_as::<_, ServiceNav>(
        r#"
        SELECT title, slug, icon_path
        FROM services
        WHERE is_active = true
        ORDER BY display_order, title
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(CommonContext { cities, services })
}

/// Canonical URL of the composite city-service page.
pub fn city_service_url(service_slug: &str, city_slug: &str) -> String {
    format!("/{}{}{}", service_slug, COMPOSITE_SEPARATOR, city_slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_service_url_uses_composite_separator() {
        assert_eq!(
            city_service_url("crm-solutions", "mumbai"),
            "/crm-solutions-services-in-mumbai"
        );
    }
}
