//! Database Models - structs representing database tables (used by sqlx/serde)
//! plus the closed enumerations accepted at the intake boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Enumerations
//
// Stored as TEXT holding the canonical snake_case token. Unrecognized tokens
// are rejected at the intake boundary, never written to the store.
// ============================================================================

/// What a lead said they are interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interest {
    SoftwareDev,
    WebsiteDev,
    Crm,
    Hrms,
    Voip,
    Api,
    Autodialer,
    Other,
}

impl Interest {
    pub const ALL: &'static [Interest] = &[
        Interest::SoftwareDev,
        Interest::WebsiteDev,
        Interest::Crm,
        Interest::Hrms,
        Interest::Voip,
        Interest::Api,
        Interest::Autodialer,
        Interest::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::SoftwareDev => "software_dev",
            Interest::WebsiteDev => "website_dev",
            Interest::Crm => "crm",
            Interest::Hrms => "hrms",
            Interest::Voip => "voip",
            Interest::Api => "api",
            Interest::Autodialer => "autodialer",
            Interest::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interest::SoftwareDev => "Software Development Service",
            Interest::WebsiteDev => "Website Development",
            Interest::Crm => "CRM Solution",
            Interest::Hrms => "HRMS Solution",
            Interest::Voip => "VOIP Service",
            Interest::Api => "API Development",
            Interest::Autodialer => "Autodialer Solution",
            Interest::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Interest> {
        Interest::ALL.iter().copied().find(|i| i.as_str() == value)
    }
}

/// Which channel generated a lead. Always stamped by the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    ContactForm,
    Newsletter,
    Download,
    Webinar,
    Demo,
    CityPage,
    LandingPage,
    Other,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::ContactForm => "contact_form",
            LeadSource::Newsletter => "newsletter",
            LeadSource::Download => "download",
            LeadSource::Webinar => "webinar",
            LeadSource::Demo => "demo",
            LeadSource::CityPage => "city_page",
            LeadSource::LandingPage => "landing_page",
            LeadSource::Other => "other",
        }
    }
}

/// Lead workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Proposal,
    Converted,
    Lost,
}

impl LeadStatus {
    pub const ALL: &'static [LeadStatus] = &[
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Proposal,
        LeadStatus::Converted,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(value: &str) -> Option<LeadStatus> {
        LeadStatus::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

/// Kind of downloadable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Ebook,
    Whitepaper,
    CaseStudy,
    Template,
    Guide,
    Other,
}

impl ResourceType {
    pub const ALL: &'static [ResourceType] = &[
        ResourceType::Ebook,
        ResourceType::Whitepaper,
        ResourceType::CaseStudy,
        ResourceType::Template,
        ResourceType::Guide,
        ResourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Ebook => "ebook",
            ResourceType::Whitepaper => "whitepaper",
            ResourceType::CaseStudy => "case_study",
            ResourceType::Template => "template",
            ResourceType::Guide => "guide",
            ResourceType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<ResourceType> {
        ResourceType::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

/// Blog section kind. Determines which type-specific fields are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Heading,
    Paragraph,
    Image,
    Video,
    Code,
    List,
}

impl SectionType {
    pub const ALL: &'static [SectionType] = &[
        SectionType::Heading,
        SectionType::Paragraph,
        SectionType::Image,
        SectionType::Video,
        SectionType::Code,
        SectionType::List,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Heading => "heading",
            SectionType::Paragraph => "paragraph",
            SectionType::Image => "image",
            SectionType::Video => "video",
            SectionType::Code => "code",
            SectionType::List => "list",
        }
    }

    pub fn parse(value: &str) -> Option<SectionType> {
        SectionType::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

// ============================================================================
// Entities
// ============================================================================

/// City where services are offered.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub state: String,
    pub is_active: bool,
    pub meta_title: String,
    pub meta_description: String,
    pub featured_image: Option<String>,
}

/// Service/product offered.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub long_description: String,
    pub icon_path: String,
    pub features: Json<Vec<String>>,
    pub benefits: Json<Vec<String>>,
    pub process: Json<Vec<String>>,
    pub is_active: bool,
    pub display_order: i32,
    pub meta_title: String,
    pub meta_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Junction row linking a city and a service, optionally overriding the
/// service's content for that city.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityService {
    pub id: Uuid,
    pub city_id: Uuid,
    pub service_id: Uuid,
    pub custom_content: String,
    pub custom_features: Json<Vec<String>>,
    pub custom_benefits: Json<Vec<String>>,
    pub success_stories: Json<Vec<String>>,
    pub meta_title: String,
    pub meta_description: String,
    pub is_active: bool,
}

/// Lead generated from the website. Immutable after creation except for
/// status/notes updates by an operator.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub city_id: Option<Uuid>,
    pub interest: String,
    pub service_id: Option<Uuid>,
    pub message: Option<String>,
    pub source: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Newsletter subscriber. Uniqueness on email is the sole dedup invariant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscriber {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub city_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Downloadable resource gated behind a lead form.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDownload {
    pub id: Uuid,
    pub title: String,
    pub resource_type: String,
    pub file_path: String,
    pub description: String,
    pub service_id: Option<Uuid>,
    pub require_name: bool,
    pub require_email: bool,
    pub require_phone: bool,
    pub require_company: bool,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Blog category.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Blog post (sectioned variant; `content` holds the lead body, sections
/// carry the structured remainder).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub category_id: Uuid,
    pub author: String,
    pub featured_image: Option<String>,
    pub summary: String,
    pub content: String,
    pub city_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub is_published: bool,
    pub featured: bool,
    pub views: i64,
    pub tags: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    /// Comma-separated `tags` split into trimmed, non-empty entries.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One ordered section of a blog post.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSection {
    pub id: Uuid,
    pub post_id: Uuid,
    pub section_type: String,
    pub heading: Option<String>,
    pub heading_level: i32,
    pub content: Option<String>,
    pub image_path: Option<String>,
    pub image_caption: Option<String>,
    pub video_url: Option<String>,
    pub code: Option<String>,
    pub code_language: Option<String>,
    pub list_items: Json<Vec<String>>,
    pub order_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_tokens_round_trip() {
        for interest in Interest::ALL {
            assert_eq!(Interest::parse(interest.as_str()), Some(*interest));
        }
        assert_eq!(Interest::parse("crm"), Some(Interest::Crm));
        assert_eq!(Interest::parse("blockchain"), None);
    }

    #[test]
    fn test_lead_status_tokens_round_trip() {
        for status in LeadStatus::ALL {
            assert_eq!(LeadStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(LeadStatus::parse("archived"), None);
    }

    #[test]
    fn test_section_type_tokens_round_trip() {
        for kind in SectionType::ALL {
            assert_eq!(SectionType::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(SectionType::parse("table"), None);
    }

    #[test]
    fn test_resource_type_case_study_token() {
        assert_eq!(ResourceType::CaseStudy.as_str(), "case_study");
        assert_eq!(
            ResourceType::parse("case_study"),
            Some(ResourceType::CaseStudy)
        );
    }

    #[test]
    fn test_enum_serde_uses_snake_case() {
        let s = serde_json::to_string(&Interest::SoftwareDev).unwrap();
        assert_eq!(s, "\"software_dev\"");
        let s = serde_json::to_string(&LeadSource::CityPage).unwrap();
        assert_eq!(s, "\"city_page\"");
    }

    #[test]
    fn test_tag_list_trims_and_drops_empty() {
        let post = BlogPost {
            id: Uuid::new_v4(),
            title: "t".into(),
            slug: "t".into(),
            category_id: Uuid::new_v4(),
            author: "a".into(),
            featured_image: None,
            summary: "s".into(),
            content: "c".into(),
            city_id: None,
            service_id: None,
            is_published: true,
            featured: false,
            views: 0,
            tags: " rust, web ,, backend ".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(post.tag_list(), vec!["rust", "web", "backend"]);
    }
}
