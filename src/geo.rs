//! City detection from the client IP.
//!
//! Optional middleware consulted at most once per visitor: once a
//! `detected_city` cookie is present the lookup is skipped. The outbound
//! geolocation call is bounded and fails open - any error, timeout, or
//! unmatched city leaves the request untouched.

use axum::{
    extract::{ConnectInfo, Request},
    http::header::{COOKIE, SET_COOKIE},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use crate::db;

pub const DETECTED_CITY_COOKIE: &str = "detected_city";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

fn enabled() -> bool {
    std::env::var("GEO_ENABLED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn api_url() -> String {
    std::env::var("GEOLOCATION_API_URL").unwrap_or_else(|_| "http://ip-api.com/json/".to_string())
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    city: Option<String>,
}

fn cookie_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == name).then(|| value.to_string())
            })
        })
}

fn client_ip(request: &Request) -> Option<String> {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
}

fn is_local(ip: &str) -> bool {
    matches!(ip, "127.0.0.1" | "localhost" | "::1")
}

/// Ask the geolocation collaborator for a city name. `None` on any failure.
async fn lookup_city_name(ip: &str) -> Option<String> {
    let url = format!("{}{}", api_url(), ip);
    let response = HTTP_CLIENT.get(&url).send().await.ok()?;
    let body: GeoResponse = response.json().await.ok()?;
    if body.status == "success" {
        body.city.filter(|c| !c.is_empty())
    } else {
        None
    }
}

/// Middleware: detect the visitor's city and remember it in a cookie.
pub async fn detect_city(request: Request, next: Next) -> Response {
    if !enabled() || cookie_value(request.headers(), DETECTED_CITY_COOKIE).is_some() {
        return next.run(request).await;
    }

    let Some(pool) = db::get_pool() else {
        return next.run(request).await;
    };

    let ip = match client_ip(&request) {
        Some(ip) if !is_local(&ip) => ip,
        _ => return next.run(request).await,
    };

    let detected_slug = match lookup_city_name(&ip).await {
        Some(city_name) => {
            // Exact case-insensitive match against our active cities only.
            sqlx::query_scalar::<_, String>(
                "SELECT slug FROM cities WHERE lower(name) = lower($1) AND is_active = true",
            )
            .bind(&city_name)
            .fetch_optional(pool.as_ref())
            .await
            .ok()
            .flatten()
        }
        None => None,
    };

    let mut response = next.run(request).await;

    if let Some(slug) = detected_slug {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            DETECTED_CITY_COOKIE, slug, COOKIE_MAX_AGE_SECS
        );
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_cookie_value_parses_multiple_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("a=1; detected_city=mumbai; b=2"),
        );
        assert_eq!(
            cookie_value(&headers, DETECTED_CITY_COOKIE),
            Some("mumbai".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_local_ips_are_skipped() {
        assert!(is_local("127.0.0.1"));
        assert!(is_local("::1"));
        assert!(!is_local("203.0.113.9"));
    }

    #[test]
    fn test_disabled_by_default() {
        if std::env::var("GEO_ENABLED").is_err() {
            assert!(!enabled());
        }
    }
}
