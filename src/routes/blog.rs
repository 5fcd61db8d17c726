/**
 * Blog Routes
 * Listing, category, and detail surfaces for published posts, including the
 * view counter, tiered related-post selection, and section/TOC assembly.
 */
use axum::{
    extract::{Path, Query},
    Json,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::context::{self, CommonContext};
use crate::db::{
    self,
    models::{BlogCategory, BlogPost, BlogSection, SectionType},
};
use crate::error::AppError;
use crate::resolve;
use crate::seo;

/// Fixed listing page size.
pub const PAGE_SIZE: i64 = 9;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// Post summary used in listings, cards, and sidebars.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostCard {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub featured_image: Option<String>,
    pub author: String,
    pub category_name: String,
    pub category_slug: String,
    pub views: i64,
    pub tags: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCard {
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListPayload {
    pub page_title: String,
    pub meta_description: String,
    pub posts: Vec<PostCard>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub categories: Vec<CategoryCard>,
    pub featured_posts: Vec<PostCard>,
    pub recent_posts: Vec<PostCard>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    pub level: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetailPayload {
    pub page_title: String,
    pub meta_description: String,
    pub post: BlogPost,
    pub tags: Vec<String>,
    pub reading_time: i64,
    pub sections: Vec<BlogSection>,
    pub toc: Vec<TocEntry>,
    pub related_posts: Vec<PostCard>,
    pub recent_posts: Vec<PostCard>,
    pub nav: CommonContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogCategoryPayload {
    pub page_title: String,
    pub meta_description: String,
    pub category: BlogCategory,
    pub posts: Vec<PostCard>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub nav: CommonContext,
}

// ============================================================================
// Pure helpers
// ============================================================================

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Estimated reading time at 200 words per minute, minimum 1.
pub fn reading_time_minutes(content: &str) -> i64 {
    let text = HTML_TAG.replace_all(content, " ");
    let words = text.split_whitespace().count() as f64;
    ((words / 200.0).round() as i64).max(1)
}

/// Table of contents: every heading-type section with non-empty heading text,
/// in ascending order, anchored by its order index.
pub fn build_toc(sections: &[BlogSection]) -> Vec<TocEntry> {
    sections
        .iter()
        .filter(|s| {
            SectionType::parse(&s.section_type) == Some(SectionType::Heading)
                && s.heading.as_deref().is_some_and(|h| !h.trim().is_empty())
        })
        .map(|s| TocEntry {
            id: format!("section-{}", s.order_index),
            title: s.heading.clone().unwrap_or_default(),
            level: s.heading_level,
        })
        .collect()
}

/// Clamp a 1-based page number and produce the query offset.
pub fn page_offset(page: i64) -> (i64, i64) {
    let page = page.max(1);
    (page, (page - 1) * PAGE_SIZE)
}

// ============================================================================
// Queries
// ============================================================================

const POST_CARD_SELECT: &str = r#"
    SELECT p.id, p.title, p.slug, p.summary, p.featured_image, p.author,
           c.name AS category_name, c.slug AS category_slug,
           p.views, p.tags, p.created_at
    FROM blog_posts p
    JOIN blog_categories c ON c.id = p.category_id
"#;

async fn published_page(
    pool: &PgPool,
    page: i64,
) -> Result<(Vec<PostCard>, i64, i64), sqlx::Error> {
    let (page, offset) = page_offset(page);

    let posts = sqlx::query_as::<_, PostCard>(&format!(
        "{} WHERE p.is_published = true ORDER BY p.created_at DESC LIMIT $1 OFFSET $2",
        POST_CARD_SELECT
    ))
    .bind(PAGE_SIZE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM blog_posts WHERE is_published = true")
            .fetch_one(pool)
            .await?;

    Ok((posts, page, total))
}

pub async fn recent_posts(
    pool: &PgPool,
    exclude: Option<Uuid>,
    limit: i64,
) -> Result<Vec<PostCard>, sqlx::Error> {
    sqlx::query_as::<_, PostCard>(&format!(
        "{} WHERE p.is_published = true AND ($1::uuid IS NULL OR p.id <> $1)
         ORDER BY p.created_at DESC LIMIT $2",
        POST_CARD_SELECT
    ))
    .bind(exclude)
    .bind(limit)
    .fetch_all(pool)
    .await
}

async fn featured_posts(pool: &PgPool, limit: i64) -> Result<Vec<PostCard>, sqlx::Error> {
    sqlx::query_as::<_, PostCard>(&format!(
        "{} WHERE p.is_published = true AND p.featured = true
         ORDER BY p.created_at DESC LIMIT $1",
        POST_CARD_SELECT
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Featured posts when any exist, otherwise the newest published posts.
pub async fn featured_or_recent(pool: &PgPool, limit: i64) -> Result<Vec<PostCard>, sqlx::Error> {
    let featured = featured_posts(pool, limit).await?;
    if featured.is_empty() {
        recent_posts(pool, None, limit).await
    } else {
        Ok(featured)
    }
}

/// Categories with at least one published post, for the category index.
async fn categories_with_posts(pool: &PgPool) -> Result<Vec<CategoryCard>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCard>(
        r#"
        SELECT c.name, c.slug, COUNT(p.id) AS post_count
        FROM blog_categories c
        JOIN blog_posts p ON p.category_id = c.id AND p.is_published = true
        GROUP BY c.id, c.name, c.slug
        HAVING COUNT(p.id) > 0
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Tiered related-post selection: same-category first (newest, ties broken by
/// view count), then the newest published posts overall to fill up to 3.
pub async fn related_posts(pool: &PgPool, post: &BlogPost) -> Result<Vec<PostCard>, sqlx::Error> {
    let mut related = sqlx::query_as::<_, PostCard>(&format!(
        "{} WHERE p.is_published = true AND p.category_id = $1 AND p.id <> $2
         ORDER BY p.created_at DESC, p.views DESC LIMIT 3",
        POST_CARD_SELECT
    ))
    .bind(post.category_id)
    .bind(post.id)
    .fetch_all(pool)
    .await?;

    if related.len() < 3 {
        let mut exclude: Vec<Uuid> = related.iter().map(|p| p.id).collect();
        exclude.push(post.id);

        let fill = sqlx::query_as::<_, PostCard>(&format!(
            "{} WHERE p.is_published = true AND p.id <> ALL($1)
             ORDER BY p.created_at DESC LIMIT $2",
            POST_CARD_SELECT
        ))
        .bind(&exclude)
        .bind(3 - related.len() as i64)
        .fetch_all(pool)
        .await?;

        related.extend(fill);
    }

    Ok(related)
}

async fn sections_of(pool: &PgPool, post_id: Uuid) -> Result<Vec<BlogSection>, sqlx::Error> {
    sqlx::query_as::<_, BlogSection>(
        r#"
        SELECT id, post_id, section_type, heading, heading_level, content,
               image_path, image_caption, video_url, code, code_language,
               list_items, order_index
        FROM blog_sections
        WHERE post_id = $1
        ORDER BY order_index ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Payload builders (shared with the slug resolver entry point)
// ============================================================================

/// Detail payload for a published post. Every successful call increments the
/// post's view counter by exactly one - repeat fetches each count.
pub async fn post_detail_payload(
    pool: &PgPool,
    post: BlogPost,
) -> Result<BlogDetailPayload, AppError> {
    sqlx::query("UPDATE blog_posts SET views = views + 1 WHERE id = $1")
        .bind(post.id)
        .execute(pool)
        .await?;

    let mut post = post;
    post.views += 1;

    let sections = sections_of(pool, post.id).await?;
    let toc = build_toc(&sections);
    let related = related_posts(pool, &post).await?;
    let recent = recent_posts(pool, Some(post.id), 5).await?;
    let nav = context::common_context(pool).await?;

    Ok(BlogDetailPayload {
        page_title: format!("{} - {} Blog", post.title, seo::site_name()),
        meta_description: post.summary.clone(),
        tags: post.tag_list(),
        reading_time: reading_time_minutes(&post.content),
        post,
        sections,
        toc,
        related_posts: related,
        recent_posts: recent,
        nav,
    })
}

pub async fn category_payload(
    pool: &PgPool,
    category: BlogCategory,
    page: i64,
) -> Result<BlogCategoryPayload, AppError> {
    let (page, offset) = page_offset(page);

    let posts = sqlx::query_as::<_, PostCard>(&format!(
        "{} WHERE p.is_published = true AND p.category_id = $1
         ORDER BY p.created_at DESC LIMIT $2 OFFSET $3",
        POST_CARD_SELECT
    ))
    .bind(category.id)
    .bind(PAGE_SIZE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM blog_posts WHERE is_published = true AND category_id = $1",
    )
    .bind(category.id)
    .fetch_one(pool)
    .await?;

    let nav = context::common_context(pool).await?;

    Ok(BlogCategoryPayload {
        page_title: format!("{} - {} Blog", category.name, seo::site_name()),
        meta_description: format!(
            "Articles and insights about {} from {}.",
            category.name,
            seo::site_name()
        ),
        category,
        posts,
        page,
        page_size: PAGE_SIZE,
        total,
        nav,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /blog - published posts, newest first, 9 per page
pub async fn list_posts(Query(query): Query<PageQuery>) -> Result<Json<BlogListPayload>, AppError> {
    let pool = db::pool()?;

    let (posts, page, total) = published_page(&pool, query.page).await?;
    let categories = categories_with_posts(&pool).await?;
    let featured = featured_posts(&pool, 3).await?;
    let recent = recent_posts(&pool, None, 5).await?;
    let nav = context::common_context(&pool).await?;

    Ok(Json(BlogListPayload {
        page_title: format!("Blog - {}", seo::site_name()),
        meta_description:
            "Latest insights, news, and articles on technology, software development, \
             and digital transformation."
                .to_string(),
        posts,
        page,
        page_size: PAGE_SIZE,
        total,
        categories,
        featured_posts: featured,
        recent_posts: recent,
        nav,
    }))
}

/// GET /blog/{slug} - post detail; bumps the view counter on every fetch
pub async fn get_post(Path(slug): Path<String>) -> Result<Json<BlogDetailPayload>, AppError> {
    let pool = db::pool()?;

    let post = resolve::published_post_by_slug(&pool, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(post_detail_payload(&pool, post).await?))
}

/// GET /blog/category/{slug} - posts filtered by category
pub async fn category_posts(
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<BlogCategoryPayload>, AppError> {
    let pool = db::pool()?;

    let category = resolve::category_by_slug(&pool, &slug)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(category_payload(&pool, category, query.page).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json as SqlJson;

    fn section(kind: &str, heading: Option<&str>, level: i32, order: i32) -> BlogSection {
        BlogSection {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            section_type: kind.to_string(),
            heading: heading.map(str::to_string),
            heading_level: level,
            content: None,
            image_path: None,
            image_caption: None,
            video_url: None,
            code: None,
            code_language: None,
            list_items: SqlJson(Vec::new()),
            order_index: order,
        }
    }

    #[test]
    fn test_reading_time_minimum_one_minute() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("a few words only"), 1);
    }

    #[test]
    fn test_reading_time_rounds_word_count() {
        let content = "word ".repeat(400);
        assert_eq!(reading_time_minutes(&content), 2);
        let content = "word ".repeat(500);
        assert_eq!(reading_time_minutes(&content), 3);
    }

    #[test]
    fn test_reading_time_ignores_markup() {
        let content = format!("<p>{}</p>", "word ".repeat(10));
        assert_eq!(reading_time_minutes(&content), 1);
    }

    #[test]
    fn test_toc_collects_only_headings_with_text() {
        let sections = vec![
            section("heading", Some("Introduction"), 2, 0),
            section("paragraph", None, 2, 1),
            section("heading", Some("  "), 2, 2),
            section("heading", None, 2, 3),
            section("heading", Some("Deep Dive"), 3, 4),
        ];
        let toc = build_toc(&sections);
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].id, "section-0");
        assert_eq!(toc[0].title, "Introduction");
        assert_eq!(toc[0].level, 2);
        assert_eq!(toc[1].id, "section-4");
        assert_eq!(toc[1].level, 3);
    }

    #[test]
    fn test_toc_preserves_section_order() {
        let sections = vec![
            section("heading", Some("First"), 2, 1),
            section("heading", Some("Second"), 2, 5),
            section("heading", Some("Third"), 2, 9),
        ];
        let titles: Vec<_> = build_toc(&sections).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_page_offset_clamps_and_scales() {
        assert_eq!(page_offset(1), (1, 0));
        assert_eq!(page_offset(2), (2, 9));
        assert_eq!(page_offset(0), (1, 0));
        assert_eq!(page_offset(-5), (1, 0));
        // Page 100 of a small blog is a valid, empty page.
        assert_eq!(page_offset(100), (100, 891));
    }
}
