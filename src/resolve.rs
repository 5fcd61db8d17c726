//! Slug/Route Resolver.
//!
//! Maps a single URL path segment to an entity: a city landing page, a
//! composite `<service>-services-in-<city>` page, a service, a blog post, or
//! a blog category. Namespaces are only unique per entity type, so a segment
//! is tried against each namespace in a fixed documented order and the first
//! hit wins. Inactive cities/services and unpublished posts are treated as
//! nonexistent.

use sqlx::PgPool;

use crate::db::models::{BlogCategory, BlogPost, City, Service};

/// Literal separator of the composite city-service URL pattern.
pub const COMPOSITE_SEPARATOR: &str = "-services-in-";

/// One lookup the resolver will attempt, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    City(String),
    Composite { service: String, city: String },
    Service(String),
    Post(String),
    Category(String),
}

/// Outcome of resolving a path segment.
#[derive(Debug, Clone)]
pub enum Resolution {
    City(City),
    CityService { service: Service, city: City },
    Service(Service),
    Post(BlogPost),
    Category(BlogCategory),
    None,
}

/// Split a segment on the composite separator. Valid only when the separator
/// occurs exactly once and both halves are non-empty.
pub fn split_composite(segment: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = segment.split(COMPOSITE_SEPARATOR).collect();
    match parts.as_slice() {
        [service, city] if !service.is_empty() && !city.is_empty() => Some((service, city)),
        _ => None,
    }
}

/// The documented lookup order for a segment.
///
/// A city slug always wins, even when it contains the composite separator
/// itself. When the segment parses as a composite, the composite attempt is
/// final: a miss on either half fails the whole resolution with no fallback
/// to the remaining namespaces.
pub fn candidates(segment: &str) -> Vec<Candidate> {
    let mut order = vec![Candidate::City(segment.to_string())];

    if let Some((service, city)) = split_composite(segment) {
        order.push(Candidate::Composite {
            service: service.to_string(),
            city: city.to_string(),
        });
        return order;
    }

    order.push(Candidate::Service(segment.to_string()));
    order.push(Candidate::Post(segment.to_string()));
    order.push(Candidate::Category(segment.to_string()));
    order
}

/// Resolve a full request path. Only single-segment paths participate;
/// multi-segment paths belong to the statically routed surfaces.
pub async fn resolve_path(pool: &PgPool, path: &str) -> Result<Resolution, sqlx::Error> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        [segment] if !segment.is_empty() => resolve_segment(pool, segment).await,
        _ => Ok(Resolution::None),
    }
}

pub async fn resolve_segment(pool: &PgPool, segment: &str) -> Result<Resolution, sqlx::Error> {
    for candidate in candidates(segment) {
        match candidate {
            Candidate::City(slug) => {
                if let Some(city) = active_city_by_slug(pool, &slug).await? {
                    return Ok(Resolution::City(city));
                }
            }
            Candidate::Composite { service, city } => {
                let service = active_service_by_slug(pool, &service).await?;
                let city = active_city_by_slug(pool, &city).await?;
                // Either half missing fails the whole resolution, no fallback.
                return Ok(match (service, city) {
                    (Some(service), Some(city)) => Resolution::CityService { service, city },
                    _ => Resolution::None,
                });
            }
            Candidate::Service(slug) => {
                if let Some(service) = active_service_by_slug(pool, &slug).await? {
                    return Ok(Resolution::Service(service));
                }
            }
            Candidate::Post(slug) => {
                if let Some(post) = published_post_by_slug(pool, &slug).await? {
                    return Ok(Resolution::Post(post));
                }
            }
            Candidate::Category(slug) => {
                if let Some(category) = category_by_slug(pool, &slug).await? {
                    return Ok(Resolution::Category(category));
                }
            }
        }
    }
    Ok(Resolution::None)
}

// ============================================================================
// Slug lookups (shared with the page handlers)
// ============================================================================

pub async fn active_city_by_slug(pool: &PgPool, slug: &str) -> Result<Option<City>, sqlx::Error> {
    sqlx::query_as::<_, City>(
        r#"
        SELECT id, name, slug, state, is_active, meta_title, meta_description, featured_image
        FROM cities
        WHERE slug = $1 AND is_active = true
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn active_service_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        r#"
        SELECT id, title, slug, short_description, long_description, icon_path,
               features, benefits, process, is_active, display_order,
               meta_title, meta_description, created_at, updated_at
        FROM services
        WHERE slug = $1 AND is_active = true
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn published_post_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(
        r#"
        SELECT id, title, slug, category_id, author, featured_image, summary, content,
               city_id, service_id, is_published, featured, views, tags,
               created_at, updated_at
        FROM blog_posts
        WHERE slug = $1 AND is_published = true
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn category_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<BlogCategory>, sqlx::Error> {
    sqlx::query_as::<_, BlogCategory>("SELECT id, name, slug FROM blog_categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_composite_two_parts() {
        assert_eq!(
            split_composite("crm-solutions-services-in-mumbai"),
            Some(("crm-solutions", "mumbai"))
        );
    }

    #[test]
    fn test_split_composite_requires_single_separator() {
        assert_eq!(split_composite("a-services-in-b-services-in-c"), None);
    }

    #[test]
    fn test_split_composite_rejects_empty_halves() {
        assert_eq!(split_composite("-services-in-mumbai"), None);
        assert_eq!(split_composite("crm-services-in-"), None);
        assert_eq!(split_composite("-services-in-"), None);
    }

    #[test]
    fn test_split_composite_plain_segment() {
        assert_eq!(split_composite("mumbai"), None);
    }

    #[test]
    fn test_city_candidate_precedes_composite() {
        // A city whose slug contains the separator must still be tried as a
        // city first, so a literal city slug wins over the composite parse.
        let order = candidates("acme-services-in-mumbai");
        assert_eq!(order[0], Candidate::City("acme-services-in-mumbai".into()));
        assert_eq!(
            order[1],
            Candidate::Composite {
                service: "acme".into(),
                city: "mumbai".into()
            }
        );
    }

    #[test]
    fn test_composite_attempt_is_final() {
        // No service/post/category fallback after a composite parse.
        let order = candidates("acme-services-in-mumbai");
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_plain_segment_tries_all_namespaces_in_order() {
        let order = candidates("delhi");
        assert_eq!(
            order,
            vec![
                Candidate::City("delhi".into()),
                Candidate::Service("delhi".into()),
                Candidate::Post("delhi".into()),
                Candidate::Category("delhi".into()),
            ]
        );
    }
}
