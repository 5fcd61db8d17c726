//! Content Composer.
//!
//! Merges a Service's base content with a CityService junction row's override
//! content into the final page payload. For every overridable field a
//! non-empty override wins; anything else falls back to the parent Service.
//! A missing junction row - or one marked inactive - yields the Service's own
//! content unchanged.

use serde::Serialize;

use crate::db::models::{City, CityService, Service};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedContent {
    pub display_title: String,
    pub meta_title: String,
    pub meta_description: String,
    pub description: String,
    pub body: String,
    pub icon_path: String,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    pub process: Vec<String>,
    pub success_stories: Vec<String>,
}

fn override_text(custom: &str, base: &str) -> String {
    if custom.trim().is_empty() {
        base.to_string()
    } else {
        custom.to_string()
    }
}

fn override_list(custom: &[String], base: &[String]) -> Vec<String> {
    if custom.is_empty() {
        base.to_vec()
    } else {
        custom.to_vec()
    }
}

/// Compose the page content for a service, optionally customized for a city.
pub fn compose(
    service: &Service,
    city: Option<&City>,
    junction: Option<&CityService>,
) -> ComposedContent {
    // Inactive junction rows behave exactly like absent ones.
    let junction = junction.filter(|cs| cs.is_active);

    let display_title = match city {
        Some(city) => format!("{} in {}", service.title, city.name),
        None => service.title.clone(),
    };

    match junction {
        Some(cs) => ComposedContent {
            display_title,
            meta_title: override_text(&cs.meta_title, &service.meta_title),
            meta_description: override_text(&cs.meta_description, &service.meta_description),
            description: service.short_description.clone(),
            body: override_text(&cs.custom_content, &service.long_description),
            icon_path: service.icon_path.clone(),
            features: override_list(&cs.custom_features, &service.features),
            benefits: override_list(&cs.custom_benefits, &service.benefits),
            process: service.process.0.clone(),
            success_stories: cs.success_stories.0.clone(),
        },
        None => ComposedContent {
            display_title,
            meta_title: service.meta_title.clone(),
            meta_description: service.meta_description.clone(),
            description: service.short_description.clone(),
            body: service.long_description.clone(),
            icon_path: service.icon_path.clone(),
            features: service.features.0.clone(),
            benefits: service.benefits.0.clone(),
            process: service.process.0.clone(),
            success_stories: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn service() -> Service {
        Service {
            id: Uuid::new_v4(),
            title: "CRM Solutions".into(),
            slug: "crm-solutions".into(),
            short_description: "Streamline customer relationships.".into(),
            long_description: "Full CRM suites for growing teams.".into(),
            icon_path: "M17 20h5".into(),
            features: Json(vec!["Lead Management".into(), "Sales Automation".into()]),
            benefits: Json(vec!["Improved conversion".into()]),
            process: Json(vec!["Needs Assessment".into(), "Implementation".into()]),
            is_active: true,
            display_order: 1,
            meta_title: "CRM Solutions | Easyian".into(),
            meta_description: "Professional CRM Solutions.".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn city() -> City {
        City {
            id: Uuid::new_v4(),
            name: "Mumbai".into(),
            slug: "mumbai".into(),
            state: "Maharashtra".into(),
            is_active: true,
            meta_title: "Professional Services in Mumbai".into(),
            meta_description: "Services in Mumbai.".into(),
            featured_image: None,
        }
    }

    fn junction(service: &Service, city: &City) -> CityService {
        CityService {
            id: Uuid::new_v4(),
            city_id: city.id,
            service_id: service.id,
            custom_content: String::new(),
            custom_features: Json(Vec::new()),
            custom_benefits: Json(Vec::new()),
            success_stories: Json(Vec::new()),
            meta_title: String::new(),
            meta_description: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_no_junction_is_identity_fallback() {
        let service = service();
        let composed = compose(&service, None, None);
        assert_eq!(composed.display_title, service.title);
        assert_eq!(composed.meta_title, service.meta_title);
        assert_eq!(composed.body, service.long_description);
        assert_eq!(composed.features, service.features.0);
        assert!(composed.success_stories.is_empty());
    }

    #[test]
    fn test_missing_junction_with_city_still_uses_service_content() {
        let service = service();
        let city = city();
        let composed = compose(&service, Some(&city), None);
        assert_eq!(composed.display_title, "CRM Solutions in Mumbai");
        assert_eq!(composed.body, service.long_description);
        assert_eq!(composed.benefits, service.benefits.0);
    }

    #[test]
    fn test_non_empty_override_wins() {
        let service = service();
        let city = city();
        let mut cs = junction(&service, &city);
        cs.custom_content = "CRM tailored for Mumbai teams.".into();
        cs.custom_features = Json(vec!["Local onboarding".into()]);
        cs.meta_title = "CRM Services in Mumbai | Easyian".into();

        let composed = compose(&service, Some(&city), Some(&cs));
        assert_eq!(composed.body, "CRM tailored for Mumbai teams.");
        assert_eq!(composed.features, vec!["Local onboarding".to_string()]);
        assert_eq!(composed.meta_title, "CRM Services in Mumbai | Easyian");
        // Fields without an override keep the parent value.
        assert_eq!(composed.meta_description, service.meta_description);
        assert_eq!(composed.benefits, service.benefits.0);
    }

    #[test]
    fn test_blank_override_falls_back() {
        let service = service();
        let city = city();
        let mut cs = junction(&service, &city);
        cs.custom_content = "   ".into();

        let composed = compose(&service, Some(&city), Some(&cs));
        assert_eq!(composed.body, service.long_description);
    }

    #[test]
    fn test_inactive_junction_behaves_like_absent() {
        let service = service();
        let city = city();
        let mut cs = junction(&service, &city);
        cs.custom_content = "Never shown".into();
        cs.is_active = false;

        let composed = compose(&service, Some(&city), Some(&cs));
        assert_eq!(composed.body, service.long_description);
        assert!(composed.success_stories.is_empty());
    }
}
