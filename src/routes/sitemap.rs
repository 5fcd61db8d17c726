/**
 * Sitemap Route
 * XML sitemap covering the static pages, active services and cities, active
 * city-service pages, published posts, and categories.
 */
use axum::{body::Body, http::header, response::Response};
use chrono::{DateTime, Utc};

use crate::context::city_service_url;
use crate::db;
use crate::seo;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

struct UrlEntry {
    loc: String,
    changefreq: &'static str,
    priority: &'static str,
    lastmod: Option<DateTime<Utc>>,
}

fn push_entry(out: &mut String, base_url: &str, entry: &UrlEntry) {
    out.push_str("  <url>\n");
    out.push_str(&format!(
        "    <loc>{}{}</loc>\n",
        escape_xml(base_url),
        escape_xml(&entry.loc)
    ));
    if let Some(lastmod) = entry.lastmod {
        out.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            lastmod.format("%Y-%m-%d")
        ));
    }
    out.push_str(&format!(
        "    <changefreq>{}</changefreq>\n",
        entry.changefreq
    ));
    out.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
    out.push_str("  </url>\n");
}

/// GET /sitemap.xml
pub async fn sitemap_xml() -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => {
            return Response::builder()
                .status(503)
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("Service unavailable"))
                .unwrap();
        }
    };

    let base_url = seo::site_url();
    let mut entries: Vec<UrlEntry> = Vec::new();

    for loc in ["/", "/services", "/contact", "/blog", "/cities"] {
        entries.push(UrlEntry {
            loc: loc.to_string(),
            changefreq: "monthly",
            priority: "0.8",
            lastmod: None,
        });
    }

    let service_slugs: Vec<String> = sqlx::query_scalar(
        "SELECT slug FROM services WHERE is_active = true ORDER BY display_order",
    )
    .fetch_all(pool.as_ref())
    .await
    .unwrap_or_default();
    for slug in &service_slugs {
        entries.push(UrlEntry {
            loc: format!("/services/{}", slug),
            changefreq: "monthly",
            priority: "0.7",
            lastmod: None,
        });
    }

    let city_slugs: Vec<String> =
        sqlx::query_scalar("SELECT slug FROM cities WHERE is_active = true ORDER BY name")
            .fetch_all(pool.as_ref())
            .await
            .unwrap_or_default();
    for slug in &city_slugs {
        entries.push(UrlEntry {
            loc: format!("/{}", slug),
            changefreq: "monthly",
            priority: "0.7",
            lastmod: None,
        });
    }

    // City-service pages carry the highest priority.
    let pairs: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT s.slug, c.slug
        FROM city_services cs
        JOIN services s ON s.id = cs.service_id
        JOIN cities c ON c.id = cs.city_id
        WHERE cs.is_active = true AND s.is_active = true AND c.is_active = true
        ORDER BY c.name, s.display_order
        "#,
    )
    .fetch_all(pool.as_ref())
    .await
    .unwrap_or_default();
    for (service_slug, city_slug) in &pairs {
        entries.push(UrlEntry {
            loc: city_service_url(service_slug, city_slug),
            changefreq: "monthly",
            priority: "0.9",
            lastmod: None,
        });
    }

    let posts: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT slug, updated_at FROM blog_posts WHERE is_published = true ORDER BY created_at DESC",
    )
    .fetch_all(pool.as_ref())
    .await
    .unwrap_or_default();
    for (slug, updated_at) in &posts {
        entries.push(UrlEntry {
            loc: format!("/blog/{}", slug),
            changefreq: "weekly",
            priority: "0.6",
            lastmod: Some(*updated_at),
        });
    }

    let category_slugs: Vec<String> =
        sqlx::query_scalar("SELECT slug FROM blog_categories ORDER BY name")
            .fetch_all(pool.as_ref())
            .await
            .unwrap_or_default();
    for slug in &category_slugs {
        entries.push(UrlEntry {
            loc: format!("/blog/category/{}", slug),
            changefreq: "monthly",
            priority: "0.5",
            lastmod: None,
        });
    }

    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in &entries {
        push_entry(&mut body, &base_url, entry);
    }
    body.push_str("</urlset>\n");

    Response::builder()
        .status(200)
        .header(header::CONTENT_TYPE, "application/xml; charset=utf-8")
        .header(
            header::CACHE_CONTROL,
            "public, max-age=3600, stale-while-revalidate=600",
        )
        .body(Body::from(body))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml_entities() {
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
    }

    #[test]
    fn test_push_entry_renders_lastmod_only_when_present() {
        let mut out = String::new();
        push_entry(
            &mut out,
            "https://example.com",
            &UrlEntry {
                loc: "/blog/x".into(),
                changefreq: "weekly",
                priority: "0.6",
                lastmod: None,
            },
        );
        assert!(out.contains("<loc>https://example.com/blog/x</loc>"));
        assert!(!out.contains("<lastmod>"));
        assert!(out.contains("<priority>0.6</priority>"));
    }
}
