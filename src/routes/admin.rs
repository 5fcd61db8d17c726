/**
 * Admin Routes
 * Thin CRUD layer over the entity schema. Create paths apply the derive-once
 * SEO rule; update paths only ever write what the operator explicitly sent.
 * Authentication proper is an external concern - a single static bearer
 * token (ADMIN_TOKEN) guards the surface.
 */
use axum::{
    extract::{Json, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::db::{
    self,
    models::{
        BlogCategory, BlogPost, City, CityService, Lead, LeadStatus,
        NewsletterSubscriber, ResourceDownload, SectionType, Service,
    },
};
use crate::error::{AppError, ErrorBody};
use crate::seo;

static ADMIN_TOKEN: Lazy<Option<String>> =
    Lazy::new(|| std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()));

// ============================================================================
// Guard & shared helpers
// ============================================================================

fn error_body(status: StatusCode, error: &str) -> Response {
    (
        status,
        axum::Json(ErrorBody {
            error: error.to_string(),
            message: None,
        }),
    )
        .into_response()
}

fn verify_admin(headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = ADMIN_TOKEN.as_deref() else {
        return Err(error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "Admin surface disabled: ADMIN_TOKEN is not set",
        ));
    };

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(t) if t == expected => Ok(()),
        Some(_) => Err(error_body(StatusCode::UNAUTHORIZED, "Invalid token")),
        None => Err(error_body(
            StatusCode::UNAUTHORIZED,
            "Authorization required",
        )),
    }
}

/// Map a store error: duplicate slug -> 409, anything else -> taxonomy.
fn write_error(e: sqlx::Error) -> Response {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return error_body(StatusCode::CONFLICT, "Slug already exists");
        }
    }
    AppError::Database(e).into_response()
}

fn slug_or_derived(explicit: &Option<String>, name: &str) -> Result<String, Response> {
    let slug = match explicit {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => seo::slugify(name),
    };
    if !seo::is_valid_slug(&slug) {
        return Err(error_body(
            StatusCode::BAD_REQUEST,
            "Slug must contain only lowercase letters, numbers, and hyphens",
        ));
    }
    Ok(slug)
}

// ============================================================================
// Cities
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityBody {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub state: String,
    pub is_active: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub featured_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCityBody {
    pub name: Option<String>,
    pub state: Option<String>,
    pub is_active: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub featured_image: Option<String>,
}

/// GET /api/admin/cities - every city, active or not
pub async fn list_cities(headers: HeaderMap) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, City>(
        r#"
        SELECT id, name, slug, state, is_active, meta_title, meta_description, featured_image
        FROM cities ORDER BY name
        "#,
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(cities) => axum::Json(cities).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// POST /api/admin/cities - create with derive-once metadata
pub async fn create_city(headers: HeaderMap, Json(body): Json<CityBody>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    if body.name.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Name is required");
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let slug = match slug_or_derived(&body.slug, &body.name) {
        Ok(s) => s,
        Err(denied) => return denied,
    };

    // Derive-once: computed now, only because the operator left them blank.
    let derived = seo::city_meta(body.name.trim());
    let meta_title = seo::or_derived(body.meta_title, derived.title);
    let meta_description = seo::or_derived(body.meta_description, derived.description);

    match sqlx::query_as::<_, City>(
        r#"
        INSERT INTO cities (name, slug, state, is_active, meta_title, meta_description, featured_image)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, name, slug, state, is_active, meta_title, meta_description, featured_image
        "#,
    )
    .bind(body.name.trim())
    .bind(&slug)
    .bind(&body.state)
    .bind(body.is_active.unwrap_or(true))
    .bind(&meta_title)
    .bind(&meta_description)
    .bind(&body.featured_image)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(city) => (StatusCode::CREATED, axum::Json(city)).into_response(),
        Err(e) => write_error(e),
    }
}

/// PATCH /api/admin/cities/{id} - partial update; metadata is written only
/// when explicitly provided, never re-derived from a changed name.
pub async fn update_city(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCityBody>,
) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, City>(
        r#"
        UPDATE cities
        SET name = COALESCE($1, name),
            state = COALESCE($2, state),
            is_active = COALESCE($3, is_active),
            meta_title = COALESCE($4, meta_title),
            meta_description = COALESCE($5, meta_description),
            featured_image = COALESCE($6, featured_image)
        WHERE id = $7
        RETURNING id, name, slug, state, is_active, meta_title, meta_description, featured_image
        "#,
    )
    .bind(&body.name)
    .bind(&body.state)
    .bind(body.is_active)
    .bind(&body.meta_title)
    .bind(&body.meta_description)
    .bind(&body.featured_image)
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(city)) => axum::Json(city).into_response(),
        Ok(None) => AppError::NotFound.into_response(),
        Err(e) => write_error(e),
    }
}

/// DELETE /api/admin/cities/{id} - cascades to junction rows; leads, posts,
/// and subscribers keep a nulled back-reference.
pub async fn delete_city(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    delete_by_id("cities", id).await
}

async fn delete_by_id(table: &str, id: Uuid) -> Response {
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let query = format!("DELETE FROM {} WHERE id = $1", table);
    match sqlx::query(&query).bind(id).execute(pool.as_ref()).await {
        Ok(result) if result.rows_affected() == 0 => AppError::NotFound.into_response(),
        Ok(_) => axum::Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBody {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub icon_path: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub process: Vec<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceBody {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub icon_path: Option<String>,
    pub features: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub process: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// GET /api/admin/services
pub async fn list_services(headers: HeaderMap) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, Service>(
        r#"
        SELECT id, title, slug, short_description, long_description, icon_path,
               features, benefits, process, is_active, display_order,
               meta_title, meta_description, created_at, updated_at
        FROM services ORDER BY display_order, title
        "#,
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(services) => axum::Json(services).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// POST /api/admin/services
pub async fn create_service(headers: HeaderMap, Json(body): Json<ServiceBody>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    if body.title.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Title is required");
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let slug = match slug_or_derived(&body.slug, &body.title) {
        Ok(s) => s,
        Err(denied) => return denied,
    };

    let derived = seo::service_meta(body.title.trim(), &body.short_description);
    let meta_title = seo::or_derived(body.meta_title, derived.title);
    let meta_description = seo::or_derived(body.meta_description, derived.description);

    match sqlx::query_as::<_, Service>(
        r#"
        INSERT INTO services (title, slug, short_description, long_description, icon_path,
                              features, benefits, process, is_active, display_order,
                              meta_title, meta_description, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now(), now())
        RETURNING id, title, slug, short_description, long_description, icon_path,
                  features, benefits, process, is_active, display_order,
                  meta_title, meta_description, created_at, updated_at
        "#,
    )
    .bind(body.title.trim())
    .bind(&slug)
    .bind(&body.short_description)
    .bind(&body.long_description)
    .bind(&body.icon_path)
    .bind(SqlJson(body.features))
    .bind(SqlJson(body.benefits))
    .bind(SqlJson(body.process))
    .bind(body.is_active.unwrap_or(true))
    .bind(body.display_order.unwrap_or(0))
    .bind(&meta_title)
    .bind(&meta_description)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(service) => (StatusCode::CREATED, axum::Json(service)).into_response(),
        Err(e) => write_error(e),
    }
}

/// PATCH /api/admin/services/{id}
pub async fn update_service(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateServiceBody>,
) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, Service>(
        r#"
        UPDATE services
        SET title = COALESCE($1, title),
            short_description = COALESCE($2, short_description),
            long_description = COALESCE($3, long_description),
            icon_path = COALESCE($4, icon_path),
            features = COALESCE($5, features),
            benefits = COALESCE($6, benefits),
            process = COALESCE($7, process),
            is_active = COALESCE($8, is_active),
            display_order = COALESCE($9, display_order),
            meta_title = COALESCE($10, meta_title),
            meta_description = COALESCE($11, meta_description),
            updated_at = now()
        WHERE id = $12
        RETURNING id, title, slug, short_description, long_description, icon_path,
                  features, benefits, process, is_active, display_order,
                  meta_title, meta_description, created_at, updated_at
        "#,
    )
    .bind(&body.title)
    .bind(&body.short_description)
    .bind(&body.long_description)
    .bind(&body.icon_path)
    .bind(body.features.map(SqlJson))
    .bind(body.benefits.map(SqlJson))
    .bind(body.process.map(SqlJson))
    .bind(body.is_active)
    .bind(body.display_order)
    .bind(&body.meta_title)
    .bind(&body.meta_description)
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(service)) => axum::Json(service).into_response(),
        Ok(None) => AppError::NotFound.into_response(),
        Err(e) => write_error(e),
    }
}

/// DELETE /api/admin/services/{id}
pub async fn delete_service(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    delete_by_id("services", id).await
}

// ============================================================================
// City-service junction rows
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityServiceBody {
    pub city_slug: String,
    pub service_slug: String,
    #[serde(default)]
    pub custom_content: String,
    #[serde(default)]
    pub custom_features: Vec<String>,
    #[serde(default)]
    pub custom_benefits: Vec<String>,
    #[serde(default)]
    pub success_stories: Vec<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCityServiceBody {
    pub custom_content: Option<String>,
    pub custom_features: Option<Vec<String>>,
    pub custom_benefits: Option<Vec<String>>,
    pub success_stories: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_active: Option<bool>,
}

/// GET /api/admin/city-services
pub async fn list_city_services(headers: HeaderMap) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, CityService>(
        r#"
        SELECT cs.id, cs.city_id, cs.service_id, cs.custom_content, cs.custom_features,
               cs.custom_benefits, cs.success_stories, cs.meta_title, cs.meta_description,
               cs.is_active
        FROM city_services cs
        JOIN cities c ON c.id = cs.city_id
        JOIN services s ON s.id = cs.service_id
        ORDER BY c.name, s.display_order
        "#,
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(rows) => axum::Json(rows).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// POST /api/admin/city-services - create a junction row by slugs
pub async fn create_city_service(headers: HeaderMap, Json(body): Json<CityServiceBody>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let lookup = sqlx::query_as::<_, (Uuid, String, Uuid, String)>(
        r#"
        SELECT c.id, c.name, s.id, s.title
        FROM cities c, services s
        WHERE c.slug = $1 AND s.slug = $2
        "#,
    )
    .bind(&body.city_slug)
    .bind(&body.service_slug)
    .fetch_optional(pool.as_ref())
    .await;

    let (city_id, city_name, service_id, service_title) = match lookup {
        Ok(Some(row)) => row,
        Ok(None) => return error_body(StatusCode::BAD_REQUEST, "Unknown city or service slug"),
        Err(e) => return AppError::Database(e).into_response(),
    };

    let derived = seo::city_service_meta(&service_title, &city_name);
    let meta_title = seo::or_derived(body.meta_title, derived.title);
    let meta_description = seo::or_derived(body.meta_description, derived.description);

    match sqlx::query_as::<_, CityService>(
        r#"
        INSERT INTO city_services (city_id, service_id, custom_content, custom_features,
                                   custom_benefits, success_stories, meta_title,
                                   meta_description, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, city_id, service_id, custom_content, custom_features,
                  custom_benefits, success_stories, meta_title, meta_description, is_active
        "#,
    )
    .bind(city_id)
    .bind(service_id)
    .bind(&body.custom_content)
    .bind(SqlJson(body.custom_features))
    .bind(SqlJson(body.custom_benefits))
    .bind(SqlJson(body.success_stories))
    .bind(&meta_title)
    .bind(&meta_description)
    .bind(body.is_active.unwrap_or(true))
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(row) => (StatusCode::CREATED, axum::Json(row)).into_response(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return error_body(
                        StatusCode::CONFLICT,
                        "A page for this city and service already exists",
                    );
                }
            }
            AppError::Database(e).into_response()
        }
    }
}

/// PATCH /api/admin/city-services/{id}
pub async fn update_city_service(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCityServiceBody>,
) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, CityService>(
        r#"
        UPDATE city_services
        SET custom_content = COALESCE($1, custom_content),
            custom_features = COALESCE($2, custom_features),
            custom_benefits = COALESCE($3, custom_benefits),
            success_stories = COALESCE($4, success_stories),
            meta_title = COALESCE($5, meta_title),
            meta_description = COALESCE($6, meta_description),
            is_active = COALESCE($7, is_active)
        WHERE id = $8
        RETURNING id, city_id, service_id, custom_content, custom_features,
                  custom_benefits, success_stories, meta_title, meta_description, is_active
        "#,
    )
    .bind(&body.custom_content)
    .bind(body.custom_features.map(SqlJson))
    .bind(body.custom_benefits.map(SqlJson))
    .bind(body.success_stories.map(SqlJson))
    .bind(&body.meta_title)
    .bind(&body.meta_description)
    .bind(body.is_active)
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(row)) => axum::Json(row).into_response(),
        Ok(None) => AppError::NotFound.into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// DELETE /api/admin/city-services/{id}
pub async fn delete_city_service(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    delete_by_id("city_services", id).await
}

// ============================================================================
// Blog categories & posts
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBody {
    pub name: String,
    pub slug: Option<String>,
}

/// GET /api/admin/blog/categories
pub async fn list_categories(headers: HeaderMap) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, BlogCategory>(
        "SELECT id, name, slug FROM blog_categories ORDER BY name",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(categories) => axum::Json(categories).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// POST /api/admin/blog/categories
pub async fn create_category(headers: HeaderMap, Json(body): Json<CategoryBody>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    if body.name.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Name is required");
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let slug = match slug_or_derived(&body.slug, &body.name) {
        Ok(s) => s,
        Err(denied) => return denied,
    };

    match sqlx::query_as::<_, BlogCategory>(
        r#"
        INSERT INTO blog_categories (name, slug)
        VALUES ($1, $2)
        RETURNING id, name, slug
        "#,
    )
    .bind(body.name.trim())
    .bind(&slug)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(category) => (StatusCode::CREATED, axum::Json(category)).into_response(),
        Err(e) => write_error(e),
    }
}

/// DELETE /api/admin/blog/categories/{id} - cascades to the category's posts
pub async fn delete_category(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    delete_by_id("blog_categories", id).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBody {
    pub section_type: String,
    pub heading: Option<String>,
    pub heading_level: Option<i32>,
    pub content: Option<String>,
    pub image_path: Option<String>,
    pub image_caption: Option<String>,
    pub video_url: Option<String>,
    pub code: Option<String>,
    pub code_language: Option<String>,
    #[serde(default)]
    pub list_items: Vec<String>,
    pub order_index: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub title: String,
    pub slug: Option<String>,
    pub category_slug: String,
    #[serde(default)]
    pub author: String,
    pub featured_image: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    pub city_slug: Option<String>,
    pub service_slug: Option<String>,
    pub is_published: Option<bool>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub sections: Vec<SectionBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostBody {
    pub title: Option<String>,
    pub featured_image: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
    pub featured: Option<bool>,
    pub tags: Option<String>,
    /// When present, replaces the full section set.
    pub sections: Option<Vec<SectionBody>>,
}

const MAX_SUMMARY_LEN: usize = 300;
const MAX_TAGS_LEN: usize = 300;

fn validate_sections(sections: &[SectionBody]) -> Result<(), Response> {
    for section in sections {
        if SectionType::parse(&section.section_type).is_none() {
            return Err(error_body(
                StatusCode::BAD_REQUEST,
                "Unknown section type",
            ));
        }
    }
    Ok(())
}

async fn replace_sections(
    pool: &sqlx::PgPool,
    post_id: Uuid,
    sections: &[SectionBody],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM blog_sections WHERE post_id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    for section in sections {
        sqlx::query(
            r#"
            INSERT INTO blog_sections (post_id, section_type, heading, heading_level, content,
                                       image_path, image_caption, video_url, code,
                                       code_language, list_items, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(post_id)
        .bind(&section.section_type)
        .bind(&section.heading)
        .bind(section.heading_level.unwrap_or(2))
        .bind(section.content.as_deref().map(ammonia::clean))
        .bind(&section.image_path)
        .bind(&section.image_caption)
        .bind(&section.video_url)
        .bind(&section.code)
        .bind(&section.code_language)
        .bind(SqlJson(section.list_items.clone()))
        .bind(section.order_index)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// GET /api/admin/blog/posts - every post, drafts included
pub async fn list_posts(headers: HeaderMap) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, BlogPost>(
        r#"
        SELECT id, title, slug, category_id, author, featured_image, summary, content,
               city_id, service_id, is_published, featured, views, tags,
               created_at, updated_at
        FROM blog_posts ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(posts) => axum::Json(posts).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// POST /api/admin/blog/posts
pub async fn create_post(headers: HeaderMap, Json(body): Json<PostBody>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    if body.title.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Title is required");
    }
    if body.summary.chars().count() > MAX_SUMMARY_LEN {
        return error_body(StatusCode::BAD_REQUEST, "Summary is too long");
    }
    if body.tags.chars().count() > MAX_TAGS_LEN {
        return error_body(StatusCode::BAD_REQUEST, "Tags are too long");
    }
    if let Err(denied) = validate_sections(&body.sections) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let slug = match slug_or_derived(&body.slug, &body.title) {
        Ok(s) => s,
        Err(denied) => return denied,
    };

    let category_id = match sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM blog_categories WHERE slug = $1",
    )
    .bind(&body.category_slug)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(id)) => id,
        Ok(None) => return error_body(StatusCode::BAD_REQUEST, "Unknown category"),
        Err(e) => return AppError::Database(e).into_response(),
    };

    let city_id = match optional_id(&pool, "cities", &body.city_slug).await {
        Ok(id) => id,
        Err(e) => return AppError::Database(e).into_response(),
    };
    let service_id = match optional_id(&pool, "services", &body.service_slug).await {
        Ok(id) => id,
        Err(e) => return AppError::Database(e).into_response(),
    };

    let content = ammonia::clean(&body.content);

    let inserted = sqlx::query_as::<_, BlogPost>(
        r#"
        INSERT INTO blog_posts (title, slug, category_id, author, featured_image, summary,
                                content, city_id, service_id, is_published, featured, tags,
                                created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now(), now())
        RETURNING id, title, slug, category_id, author, featured_image, summary, content,
                  city_id, service_id, is_published, featured, views, tags,
                  created_at, updated_at
        "#,
    )
    .bind(body.title.trim())
    .bind(&slug)
    .bind(category_id)
    .bind(&body.author)
    .bind(&body.featured_image)
    .bind(&body.summary)
    .bind(&content)
    .bind(city_id)
    .bind(service_id)
    .bind(body.is_published.unwrap_or(true))
    .bind(body.featured.unwrap_or(false))
    .bind(&body.tags)
    .fetch_one(pool.as_ref())
    .await;

    let post = match inserted {
        Ok(post) => post,
        Err(e) => return write_error(e),
    };

    if !body.sections.is_empty() {
        if let Err(e) = replace_sections(&pool, post.id, &body.sections).await {
            return AppError::Database(e).into_response();
        }
    }

    (StatusCode::CREATED, axum::Json(post)).into_response()
}

async fn optional_id(
    pool: &sqlx::PgPool,
    table: &str,
    slug: &Option<String>,
) -> Result<Option<Uuid>, sqlx::Error> {
    let Some(slug) = slug.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let query = format!("SELECT id FROM {} WHERE slug = $1", table);
    sqlx::query_scalar::<_, Uuid>(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// PATCH /api/admin/blog/posts/{slug}
pub async fn update_post(
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<UpdatePostBody>,
) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    if let Some(summary) = &body.summary {
        if summary.chars().count() > MAX_SUMMARY_LEN {
            return error_body(StatusCode::BAD_REQUEST, "Summary is too long");
        }
    }
    if let Some(sections) = &body.sections {
        if let Err(denied) = validate_sections(sections) {
            return denied;
        }
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let content = body.content.as_deref().map(ammonia::clean);

    let updated = sqlx::query_as::<_, BlogPost>(
        r#"
        UPDATE blog_posts
        SET title = COALESCE($1, title),
            featured_image = COALESCE($2, featured_image),
            summary = COALESCE($3, summary),
            content = COALESCE($4, content),
            is_published = COALESCE($5, is_published),
            featured = COALESCE($6, featured),
            tags = COALESCE($7, tags),
            updated_at = now()
        WHERE slug = $8
        RETURNING id, title, slug, category_id, author, featured_image, summary, content,
                  city_id, service_id, is_published, featured, views, tags,
                  created_at, updated_at
        "#,
    )
    .bind(&body.title)
    .bind(&body.featured_image)
    .bind(&body.summary)
    .bind(&content)
    .bind(body.is_published)
    .bind(body.featured)
    .bind(&body.tags)
    .bind(&slug)
    .fetch_optional(pool.as_ref())
    .await;

    let post = match updated {
        Ok(Some(post)) => post,
        Ok(None) => return AppError::NotFound.into_response(),
        Err(e) => return AppError::Database(e).into_response(),
    };

    if let Some(sections) = &body.sections {
        if let Err(e) = replace_sections(&pool, post.id, sections).await {
            return AppError::Database(e).into_response();
        }
    }

    axum::Json(post).into_response()
}

/// DELETE /api/admin/blog/posts/{slug}
pub async fn delete_post(headers: HeaderMap, Path(slug): Path<String>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query("DELETE FROM blog_posts WHERE slug = $1")
        .bind(&slug)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => AppError::NotFound.into_response(),
        Ok(_) => axum::Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

// ============================================================================
// Leads & subscribers
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdateBody {
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/admin/leads - newest first
pub async fn list_leads(headers: HeaderMap) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, Lead>(
        r#"
        SELECT id, name, email, phone, company, job_title, city_id, interest,
               service_id, message, source, status, notes, created_at, updated_at
        FROM leads ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(leads) => axum::Json(leads).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// PATCH /api/admin/leads/{id} - leads are immutable except status and notes
pub async fn update_lead(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<LeadUpdateBody>,
) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }

    if let Some(status) = body.status.as_deref() {
        if LeadStatus::parse(status).is_none() {
            return error_body(StatusCode::BAD_REQUEST, "Unknown lead status");
        }
    }

    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, Lead>(
        r#"
        UPDATE leads
        SET status = COALESCE($1, status),
            notes = COALESCE($2, notes),
            updated_at = now()
        WHERE id = $3
        RETURNING id, name, email, phone, company, job_title, city_id, interest,
                  service_id, message, source, status, notes, created_at, updated_at
        "#,
    )
    .bind(&body.status)
    .bind(&body.notes)
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(lead)) => axum::Json(lead).into_response(),
        Ok(None) => AppError::NotFound.into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// GET /api/admin/subscribers - the core never deletes subscribers
pub async fn list_subscribers(headers: HeaderMap) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match sqlx::query_as::<_, NewsletterSubscriber>(
        r#"
        SELECT id, email, name, city_id, is_active, created_at
        FROM newsletter_subscribers ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(subscribers) => axum::Json(subscribers).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBody {
    pub title: String,
    pub resource_type: String,
    pub file_path: String,
    #[serde(default)]
    pub description: String,
    pub service_slug: Option<String>,
    pub require_name: Option<bool>,
    pub require_email: Option<bool>,
    pub require_phone: Option<bool>,
    pub require_company: Option<bool>,
}

/// POST /api/admin/resources
pub async fn create_resource(headers: HeaderMap, Json(body): Json<ResourceBody>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    if body.title.trim().is_empty() || body.file_path.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Title and file are required");
    }
    if crate::db::models::ResourceType::parse(&body.resource_type).is_none() {
        return error_body(StatusCode::BAD_REQUEST, "Unknown resource type");
    }
    let pool = match db::pool() {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let service_id = match optional_id(&pool, "services", &body.service_slug).await {
        Ok(id) => id,
        Err(e) => return AppError::Database(e).into_response(),
    };

    match sqlx::query_as::<_, ResourceDownload>(
        r#"
        INSERT INTO resource_downloads (title, resource_type, file_path, description,
                                        service_id, require_name, require_email,
                                        require_phone, require_company,
                                        created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
        RETURNING id, title, resource_type, file_path, description, service_id,
                  require_name, require_email, require_phone, require_company,
                  download_count, created_at, updated_at
        "#,
    )
    .bind(body.title.trim())
    .bind(&body.resource_type)
    .bind(body.file_path.trim())
    .bind(&body.description)
    .bind(service_id)
    .bind(body.require_name.unwrap_or(true))
    .bind(body.require_email.unwrap_or(true))
    .bind(body.require_phone.unwrap_or(false))
    .bind(body.require_company.unwrap_or(false))
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(resource) => (StatusCode::CREATED, axum::Json(resource)).into_response(),
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// DELETE /api/admin/resources/{id}
pub async fn delete_resource(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(denied) = verify_admin(&headers) {
        return denied;
    }
    delete_by_id("resource_downloads", id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_verify_admin_rejects_without_token_configured() {
        if ADMIN_TOKEN.is_none() {
            let result = verify_admin(&HeaderMap::new());
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_verify_admin_rejects_missing_header() {
        // Regardless of configuration, an empty header never passes.
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer nope"));
        assert!(verify_admin(&headers).is_err() || ADMIN_TOKEN.as_deref() == Some("nope"));
    }

    #[test]
    fn test_slug_or_derived_validates_explicit_slug() {
        assert!(slug_or_derived(&Some("Bad Slug!".into()), "x").is_err());
        assert_eq!(
            slug_or_derived(&Some("good-slug".into()), "x").unwrap(),
            "good-slug"
        );
        assert_eq!(
            slug_or_derived(&None, "CRM Solutions").unwrap(),
            "crm-solutions"
        );
    }

    #[test]
    fn test_validate_sections_rejects_unknown_type() {
        let sections = vec![SectionBody {
            section_type: "table".into(),
            heading: None,
            heading_level: None,
            content: None,
            image_path: None,
            image_caption: None,
            video_url: None,
            code: None,
            code_language: None,
            list_items: Vec::new(),
            order_index: 0,
        }];
        assert!(validate_sections(&sections).is_err());
    }
}
