//! Slug and SEO metadata derivation.
//!
//! Meta titles/descriptions are derived once, at first persist, and only when
//! the operator supplied no explicit value. Later edits to the underlying name
//! never recompute a previously-derived field.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Site name used in derived metadata, configurable via SITE_NAME.
pub fn site_name() -> String {
    std::env::var("SITE_NAME").unwrap_or_else(|_| "Easyian".to_string())
}

/// Public base URL used in sitemap/feed links, configurable via SITE_URL.
pub fn site_url() -> String {
    std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// URL-safe slug from a human-readable name: lowercased, alphanumeric runs
/// joined by single hyphens.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMeta {
    pub title: String,
    pub description: String,
}

pub fn city_meta(city_name: &str) -> DerivedMeta {
    let site = site_name();
    DerivedMeta {
        title: format!("Professional Services in {} | {}", city_name, site),
        description: format!(
            "Discover {}'s premium technology services in {}. \
             Expert solutions for businesses of all sizes.",
            site, city_name
        ),
    }
}

pub fn service_meta(title: &str, short_description: &str) -> DerivedMeta {
    let site = site_name();
    DerivedMeta {
        title: format!("{} | {}", title, site),
        description: format!(
            "Professional {} services from {}. {}",
            title, site, short_description
        ),
    }
}

pub fn city_service_meta(service_title: &str, city_name: &str) -> DerivedMeta {
    let site = site_name();
    DerivedMeta {
        title: format!("{} Services in {} | {}", service_title, city_name, site),
        description: format!(
            "Professional {} services in {}. \
             Expert solutions tailored for local businesses.",
            service_title, city_name
        ),
    }
}

/// Derive-once helper: keep a non-empty explicit value, otherwise take the
/// derived one. Used exclusively on create paths.
pub fn or_derived(explicit: Option<String>, derived: String) -> String {
    match explicit {
        Some(value) if !value.trim().is_empty() => value,
        _ => derived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Software Development"), "software-development");
        assert_eq!(slugify("CRM Solutions"), "crm-solutions");
    }

    #[test]
    fn test_slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("  VoIP & Telephony!  "), "voip-telephony");
        assert_eq!(slugify("--a--b--"), "a-b");
    }

    #[test]
    fn test_slugify_output_is_valid_slug() {
        for input in ["Delhi", "New Delhi NCR", "API Development (v2)"] {
            assert!(is_valid_slug(&slugify(input)), "bad slug for {:?}", input);
        }
    }

    #[test]
    fn test_city_meta_interpolates_name() {
        let meta = city_meta("Mumbai");
        assert!(meta.title.contains("Mumbai"));
        assert!(meta.description.contains("Mumbai"));
    }

    #[test]
    fn test_city_service_meta_interpolates_both_names() {
        let meta = city_service_meta("CRM Solutions", "Pune");
        assert!(meta.title.contains("CRM Solutions"));
        assert!(meta.title.contains("Pune"));
        assert!(meta.description.contains("Pune"));
    }

    #[test]
    fn test_or_derived_keeps_explicit_value() {
        assert_eq!(
            or_derived(Some("Custom".into()), "Derived".into()),
            "Custom"
        );
        assert_eq!(or_derived(Some("  ".into()), "Derived".into()), "Derived");
        assert_eq!(or_derived(None, "Derived".into()), "Derived");
    }
}
