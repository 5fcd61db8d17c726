/**
 * City Routes
 * City landing pages, city-scoped services/blog/contact, the composite
 * `{service}-services-in-{city}` page, and the single-segment slug resolver
 * entry point that dispatches between all of them.
 */
use axum::{
    extract::{Form, Path, Query},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::content::{self, ComposedContent};
use crate::context::{self, city_service_url, CommonContext};
use crate::db::{
    self,
    models::{City, CityService, LeadSource, Service},
};
use crate::error::AppError;
use crate::intake::{self, ContactPayload, NewLead};
use crate::resolve::{self, Resolution};
use crate::routes::blog::{self, PageQuery, PostCard, PAGE_SIZE};
use crate::routes::contact::interest_options;

// ============================================================================
// Response Types
// ============================================================================

/// A service as offered in a specific city, addressed by its composite URL.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CityServiceCard {
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub icon_path: String,
    #[sqlx(skip)]
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityHomePayload {
    pub page_title: String,
    pub meta_description: String,
    pub city: City,
    pub services: Vec<CityServiceCard>,
    pub latest_posts: Vec<PostCard>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityListPayload {
    pub page_title: String,
    pub meta_description: String,
    pub cities: Vec<City>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityServicesPayload {
    pub page_title: String,
    pub meta_description: String,
    pub city: City,
    pub services: Vec<CityServiceCard>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityBlogPayload {
    pub page_title: String,
    pub meta_description: String,
    pub city: City,
    pub posts: Vec<PostCard>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityContactPayload {
    pub page_title: String,
    pub meta_description: String,
    pub city: City,
    pub interests: Vec<crate::routes::contact::InterestOption>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityServicePagePayload {
    pub page_title: String,
    pub meta_description: String,
    pub city: City,
    pub service_slug: String,
    pub url: String,
    pub content: ComposedContent,
    pub nav: CommonContext,
}

// ============================================================================
// Queries
// ============================================================================

/// Active services offered in a city: junction row active, parent service
/// active. Ordered like the generic service list.
async fn city_service_cards(
    pool: &PgPool,
    city: &City,
) -> Result<Vec<CityServiceCard>, sqlx::Error> {
    let mut cards = sqlx::query_as::<_, CityServiceCard>(
        r#"
        SELECT s.title, s.slug, s.short_description, s.icon_path
        FROM city_services cs
        JOIN services s ON s.id = cs.service_id
        WHERE cs.city_id = $1 AND cs.is_active = true AND s.is_active = true
        ORDER BY s.display_order, s.title
        "#,
    )
    .bind(city.id)
    .fetch_all(pool)
    .await?;

    for card in &mut cards {
        card.url = city_service_url(&card.slug, &city.slug);
    }

    Ok(cards)
}

async fn junction_for(
    pool: &PgPool,
    city_id: Uuid,
    service_id: Uuid,
) -> Result<Option<CityService>, sqlx::Error> {
    sqlx::query_as::<_, CityService>(
        r#"
        SELECT id, city_id, service_id, custom_content, custom_features,
               custom_benefits, success_stories, meta_title, meta_description, is_active
        FROM city_services
        WHERE city_id = $1 AND service_id = $2
        "#,
    )
    .bind(city_id)
    .bind(service_id)
    .fetch_optional(pool)
    .await
}

/// Posts shown on a city's blog: posts tagged to the city plus untagged
/// (generic) posts.
async fn city_posts(
    pool: &PgPool,
    city_id: Uuid,
    page: i64,
) -> Result<(Vec<PostCard>, i64, i64), sqlx::Error> {
    let (page, offset) = blog::page_offset(page);

    let posts = sqlx::query_as::<_, PostCard>(
        r#"
        SELECT p.id, p.title, p.slug, p.summary, p.featured_image, p.author,
               c.name AS category_name, c.slug AS category_slug,
               p.views, p.tags, p.created_at
        FROM blog_posts p
        JOIN blog_categories c ON c.id = p.category_id
        WHERE p.is_published = true AND (p.city_id = $1 OR p.city_id IS NULL)
        ORDER BY p.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(city_id)
    .bind(PAGE_SIZE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM blog_posts
        WHERE is_published = true AND (city_id = $1 OR city_id IS NULL)
        "#,
    )
    .bind(city_id)
    .fetch_one(pool)
    .await?;

    Ok((posts, page, total))
}

async fn require_city(pool: &PgPool, slug: &str) -> Result<City, AppError> {
    resolve::active_city_by_slug(pool, slug)
        .await?
        .ok_or(AppError::NotFound)
}

// ============================================================================
// Payload builders
// ============================================================================

async fn city_home_payload(pool: &PgPool, city: City) -> Result<CityHomePayload, AppError> {
    let services = city_service_cards(pool, &city).await?;
    let (latest_posts, _, _) = city_posts(pool, city.id, 1).await?;
    let nav = context::common_context(pool).await?;

    Ok(CityHomePayload {
        page_title: city.meta_title.clone(),
        meta_description: city.meta_description.clone(),
        city,
        services,
        latest_posts: latest_posts.into_iter().take(3).collect(),
        nav,
    })
}

async fn city_service_page_payload(
    pool: &PgPool,
    service: Service,
    city: City,
) -> Result<CityServicePagePayload, AppError> {
    let junction = junction_for(pool, city.id, service.id).await?;
    let content = content::compose(&service, Some(&city), junction.as_ref());
    let nav = context::common_context(pool).await?;

    Ok(CityServicePagePayload {
        page_title: content.meta_title.clone(),
        meta_description: content.meta_description.clone(),
        url: city_service_url(&service.slug, &city.slug),
        service_slug: service.slug,
        city,
        content,
        nav,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /{slug} - single-segment resolver entry point. Dispatches to the city
/// landing page, the composite city-service page, or the service/blog
/// fallbacks, in the resolver's documented precedence order.
pub async fn resolve_entry(Path(slug): Path<String>) -> Result<Response, AppError> {
    let pool = db::pool()?;

    match resolve::resolve_segment(&pool, &slug).await? {
        Resolution::City(city) => {
            Ok(Json(city_home_payload(&pool, city).await?).into_response())
        }
        Resolution::CityService { service, city } => {
            Ok(Json(city_service_page_payload(&pool, service, city).await?).into_response())
        }
        Resolution::Service(service) => Ok(Json(
            crate::routes::services::service_detail_payload(&pool, service).await?,
        )
        .into_response()),
        Resolution::Post(post) => {
            Ok(Json(blog::post_detail_payload(&pool, post).await?).into_response())
        }
        Resolution::Category(category) => {
            Ok(Json(blog::category_payload(&pool, category, 1).await?).into_response())
        }
        Resolution::None => Err(AppError::NotFound),
    }
}

/// GET /cities - all active cities
pub async fn list_cities() -> Result<Json<CityListPayload>, AppError> {
    let pool = db::pool()?;

    let cities = crate::routes::home::active_cities(&pool).await?;
    let nav = context::common_context(&pool).await?;

    Ok(Json(CityListPayload {
        page_title: format!("Our Locations - {}", crate::seo::site_name()),
        meta_description: "Cities where our services are available.".to_string(),
        cities,
        nav,
    }))
}

/// GET /{slug}/services - services offered in a city
pub async fn city_services(Path(slug): Path<String>) -> Result<Json<CityServicesPayload>, AppError> {
    let pool = db::pool()?;
    let city = require_city(&pool, &slug).await?;

    let services = city_service_cards(&pool, &city).await?;
    let nav = context::common_context(&pool).await?;

    Ok(Json(CityServicesPayload {
        page_title: format!("Our Services in {} - {}", city.name, crate::seo::site_name()),
        meta_description: city.meta_description.clone(),
        city,
        services,
        nav,
    }))
}

/// GET /{slug}/blog - city-scoped blog listing
pub async fn city_blog(
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CityBlogPayload>, AppError> {
    let pool = db::pool()?;
    let city = require_city(&pool, &slug).await?;

    let (posts, page, total) = city_posts(&pool, city.id, query.page).await?;
    let nav = context::common_context(&pool).await?;

    Ok(Json(CityBlogPayload {
        page_title: format!("Blog - {} - {}", city.name, crate::seo::site_name()),
        meta_description: format!("Insights and updates from {}.", city.name),
        city,
        posts,
        page,
        page_size: PAGE_SIZE,
        total,
        nav,
    }))
}

/// GET /{slug}/contact - city contact page payload
pub async fn city_contact_form(
    Path(slug): Path<String>,
) -> Result<Json<CityContactPayload>, AppError> {
    let pool = db::pool()?;
    let city = require_city(&pool, &slug).await?;

    let nav = context::common_context(&pool).await?;

    Ok(Json(CityContactPayload {
        page_title: format!("Contact Us in {} - {}", city.name, crate::seo::site_name()),
        meta_description: city.meta_description.clone(),
        city,
        interests: interest_options(),
        nav,
    }))
}

/// POST /{slug}/contact - lead from a city landing page
pub async fn submit_city_contact(
    Path(slug): Path<String>,
    Form(payload): Form<ContactPayload>,
) -> Result<Response, AppError> {
    let pool = db::pool()?;
    let city = require_city(&pool, &slug).await?;

    if let Err(errors) = intake::validate_contact(&payload) {
        return Ok(errors.into_response_with(&payload));
    }

    let mut lead = NewLead::from_contact(&payload, LeadSource::CityPage);
    lead.city_id = Some(city.id);
    let lead = intake::create_lead(&pool, lead).await?;

    if payload.wants_newsletter() {
        intake::subscribe_best_effort(&pool, &lead.email, Some(&lead.name), Some(city.id)).await;
    }

    Ok(Redirect::to("/contact/success").into_response())
}

/// POST /{slug} - contact form on a composite city-service page. Only valid
/// when the segment resolves to a city-service pair.
pub async fn submit_city_service_contact(
    Path(slug): Path<String>,
    Form(payload): Form<ContactPayload>,
) -> Result<Response, AppError> {
    let pool = db::pool()?;

    let (service, city) = match resolve::resolve_segment(&pool, &slug).await? {
        Resolution::CityService { service, city } => (service, city),
        _ => return Err(AppError::NotFound),
    };

    if let Err(errors) = intake::validate_contact(&payload) {
        return Ok(errors.into_response_with(&payload));
    }

    let mut lead = NewLead::from_contact(&payload, LeadSource::LandingPage);
    lead.city_id = Some(city.id);
    lead.service_id = Some(service.id);
    // Interest comes from the service slug, not the payload: only an exact
    // enum-token match counts, anything else stays "other".
    lead.interest = intake::interest_for_service(&service.slug);
    let lead = intake::create_lead(&pool, lead).await?;

    if payload.wants_newsletter() {
        intake::subscribe_best_effort(&pool, &lead.email, Some(&lead.name), Some(city.id)).await;
    }

    Ok(Redirect::to("/contact/success").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Interest;

    #[test]
    fn test_interest_derivation_for_composite_contact() {
        // Exact enumeration match -> that interest; anything else -> other.
        assert_eq!(intake::interest_for_service("crm"), Interest::Crm);
        assert_eq!(intake::interest_for_service("crm-solutions"), Interest::Other);
    }

    #[test]
    fn test_city_service_card_urls() {
        assert_eq!(
            city_service_url("voip-services", "pune"),
            "/voip-services-services-in-pune"
        );
    }
}
