//! Startup seed data.
//!
//! The initial cities, services, and city-service junction rows live here as
//! seed rows loaded into the store, so the content pipeline reads everything
//! from one place. Seeding runs only against an empty cities table and every
//! insert is idempotent.

use sqlx::PgPool;

use crate::seo;

struct CitySeed {
    name: &'static str,
    state: &'static str,
}

struct ServiceSeed {
    title: &'static str,
    short_description: &'static str,
    long_description: &'static str,
    icon_path: &'static str,
    features: &'static [&'static str],
    benefits: &'static [&'static str],
    process: &'static [&'static str],
    display_order: i32,
}

const CITIES: &[CitySeed] = &[
    CitySeed { name: "Delhi", state: "Delhi" },
    CitySeed { name: "Mumbai", state: "Maharashtra" },
    CitySeed { name: "Bangalore", state: "Karnataka" },
    CitySeed { name: "Hyderabad", state: "Telangana" },
    CitySeed { name: "Chennai", state: "Tamil Nadu" },
    CitySeed { name: "Kolkata", state: "West Bengal" },
    CitySeed { name: "Pune", state: "Maharashtra" },
    CitySeed { name: "Ahmedabad", state: "Gujarat" },
    CitySeed { name: "Jaipur", state: "Rajasthan" },
    CitySeed { name: "Gurgaon", state: "Haryana" },
    CitySeed { name: "Noida", state: "Uttar Pradesh" },
];

const SERVICES: &[ServiceSeed] = &[
    ServiceSeed {
        title: "Software Development",
        short_description:
            "Custom software solutions designed to meet your unique business requirements.",
        long_description:
            "Our expert team of developers creates tailored software solutions that address \
             your specific business challenges. We follow industry best practices and use \
             cutting-edge technologies to deliver high-quality, scalable, and maintainable \
             software that drives business growth and efficiency.",
        icon_path: "M10 20l4-16m4 4l4 4-4 4M6 16l-4-4 4-4",
        features: &[
            "Custom Application Development",
            "Enterprise Software Solutions",
            "Mobile App Development",
            "Legacy System Modernization",
            "Web Application Development",
            "Cross-Platform Solutions",
        ],
        benefits: &[
            "Increased operational efficiency",
            "Reduced costs and improved ROI",
            "Enhanced customer experience",
            "Competitive advantage in your market",
            "Scalable solutions that grow with your business",
        ],
        process: &[
            "Requirements Analysis",
            "Design & Planning",
            "Development",
            "Testing & QA",
            "Deployment",
            "Maintenance & Support",
        ],
        display_order: 1,
    },
    ServiceSeed {
        title: "Website Development",
        short_description:
            "Professional websites that attract visitors, engage users, and convert leads.",
        long_description:
            "We create stunning, responsive websites that not only look great but also perform \
             exceptionally well. Our web development team combines attractive design with \
             optimized functionality to ensure your site delivers an outstanding user \
             experience across all devices while achieving your business objectives.",
        icon_path: "M20 13V6a2 2 0 00-2-2H6a2 2 0 00-2 2v7m16 0v5a2 2 0 01-2 2H6a2 2 0 01-2-2v-5m16 0h-2.586a1 1 0 00-.707.293l-2.414 2.414a1 1 0 01-.707.293h-3.172a1 1 0 01-.707-.293l-2.414-2.414A1 1 0 006.586 13H4",
        features: &[
            "Responsive Web Design",
            "E-commerce Websites",
            "Content Management Systems",
            "Landing Pages",
            "Progressive Web Apps",
            "Website Redesign & Optimization",
        ],
        benefits: &[
            "Professional brand representation",
            "Mobile-friendly user experience",
            "Improved conversion rates",
            "SEO optimization",
            "Easy content management",
        ],
        process: &[
            "Discovery & Planning",
            "Wireframing & Design",
            "Development",
            "Content Integration",
            "Testing & Launch",
            "Maintenance & Support",
        ],
        display_order: 2,
    },
    ServiceSeed {
        title: "CRM Solutions",
        short_description:
            "Streamline customer relationships and boost sales with our powerful CRM systems.",
        long_description:
            "Our Customer Relationship Management solutions help you manage interactions with \
             current and potential customers. We provide robust CRM systems that centralize \
             customer data, automate sales processes, and provide valuable insights to improve \
             customer relationships and increase revenue.",
        icon_path: "M17 20h5v-2a3 3 0 00-5.356-1.857M17 20H7m10 0v-2c0-.656-.126-1.283-.356-1.857M7 20H2v-2a3 3 0 015.356-1.857M7 20v-2c0-.656.126-1.283.356-1.857m0 0a5.002 5.002 0 019.288 0M15 7a3 3 0 11-6 0 3 3 0 016 0zm6 3a2 2 0 11-4 0 2 2 0 014 0zM7 10a2 2 0 11-4 0 2 2 0 014 0z",
        features: &[
            "Lead Management",
            "Sales Automation",
            "Contact Management",
            "Pipeline Management",
            "Analytics and Reporting",
            "Customer Support Integration",
        ],
        benefits: &[
            "Improved lead conversion rates",
            "Enhanced customer retention",
            "Streamlined sales processes",
            "Data-driven decision making",
            "Increased team collaboration",
        ],
        process: &[
            "Needs Assessment",
            "Solution Design",
            "Implementation",
            "Data Migration",
            "Training",
            "Ongoing Support",
        ],
        display_order: 3,
    },
    ServiceSeed {
        title: "HRMS Solutions",
        short_description:
            "Optimize your HR processes with our comprehensive human resource management systems.",
        long_description:
            "Our Human Resource Management Systems streamline and automate HR functions from \
             recruitment to retirement. We provide integrated solutions that handle employee \
             data management, payroll processing, benefits administration, performance \
             tracking, and more, allowing your HR team to focus on strategic initiatives.",
        icon_path: "M9 5H7a2 2 0 00-2 2v12a2 2 0 002 2h10a2 2 0 002-2V7a2 2 0 00-2-2h-2M9 5a2 2 0 002 2h2a2 2 0 002-2M9 5a2 2 0 012-2h2a2 2 0 012 2m-3 7h3m-3 4h3m-6-4h.01M9 16h.01",
        features: &[
            "Employee Management",
            "Payroll Automation",
            "Time and Attendance Tracking",
            "Performance Management",
            "Recruitment and Onboarding",
            "Benefits Administration",
        ],
        benefits: &[
            "Reduced administrative workload",
            "Improved HR data accuracy",
            "Enhanced compliance management",
            "Better employee experience",
            "Streamlined HR processes",
        ],
        process: &[
            "Requirements Gathering",
            "System Configuration",
            "Data Import",
            "Process Integration",
            "User Training",
            "Go-Live & Support",
        ],
        display_order: 4,
    },
    ServiceSeed {
        title: "VoIP Services",
        short_description: "Advanced voice communication solutions for your business needs.",
        long_description:
            "Our Voice over Internet Protocol (VoIP) services provide advanced communication \
             solutions that use internet technology to deliver voice calls, video \
             conferencing, and messaging. We offer reliable, cost-effective VoIP systems that \
             enhance communication while reducing costs compared to traditional phone systems.",
        icon_path: "M3 5a2 2 0 012-2h3.28a1 1 0 01.948.684l1.498 4.493a1 1 0 01-.502 1.21l-2.257 1.13a11.042 11.042 0 005.516 5.516l1.13-2.257a1 1 0 011.21-.502l4.493 1.498a1 1 0 01.684.949V19a2 2 0 01-2 2h-1C9.716 21 3 14.284 3 6V5z",
        features: &[
            "Cloud PBX Systems",
            "SIP Trunking",
            "Call Center Solutions",
            "Unified Communications",
            "Video Conferencing",
            "Mobile Integration",
        ],
        benefits: &[
            "Reduced communication costs",
            "Enhanced mobility and flexibility",
            "Improved call quality and reliability",
            "Scalable to grow with your business",
            "Advanced features not available with traditional phones",
        ],
        process: &[
            "Network Assessment",
            "Solution Design",
            "System Configuration",
            "Number Porting",
            "Installation & Testing",
            "Training & Support",
        ],
        display_order: 5,
    },
    ServiceSeed {
        title: "Autodialer Solutions",
        short_description:
            "Enhance your outbound call operations with our advanced autodialer systems.",
        long_description:
            "Our Autodialer Solutions automate outbound calling for sales, marketing, customer \
             service, and debt collection. We provide sophisticated dialing systems with \
             features like predictive dialing, call scripting, and analytics to maximize agent \
             productivity and improve campaign results.",
        icon_path: "M3 5a2 2 0 012-2h3.28a1 1 0 01.948.684l1.498 4.493a1 1 0 01-.502 1.21l-2.257 1.13a11.042 11.042 0 005.516 5.516l1.13-2.257a1 1 0 011.21-.502l4.493 1.498a1 1 0 01.684.949V19a2 2 0 01-2 2h-1C9.716 21 3 14.284 3 6V5z",
        features: &[
            "Predictive Dialing",
            "Preview Dialing",
            "Progressive Dialing",
            "IVR Integration",
            "Call Analytics",
            "Campaign Management",
        ],
        benefits: &[
            "Increased agent productivity",
            "Higher contact rates",
            "Improved campaign ROI",
            "Advanced reporting capabilities",
            "Reduced idle time for agents",
        ],
        process: &[
            "Needs Assessment",
            "System Configuration",
            "Campaign Setup",
            "Integration with CRM",
            "Agent Training",
            "Performance Optimization",
        ],
        display_order: 6,
    },
];

/// Seed cities, services, and the full city-service junction grid when the
/// store is empty. Safe to call on every startup.
pub async fn run_if_empty(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (city_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cities")
        .fetch_one(pool)
        .await?;

    if city_count > 0 {
        tracing::debug!("Seed skipped: cities table already populated");
        return Ok(());
    }

    tracing::info!("Seeding cities, services, and city-service pages...");

    for city in CITIES {
        let meta = seo::city_meta(city.name);
        sqlx::query(
            r#"
            INSERT INTO cities (name, slug, state, is_active, meta_title, meta_description)
            VALUES ($1, $2, $3, true, $4, $5)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(city.name)
        .bind(seo::slugify(city.name))
        .bind(city.state)
        .bind(&meta.title)
        .bind(&meta.description)
        .execute(pool)
        .await?;
    }

    for service in SERVICES {
        let meta = seo::service_meta(service.title, service.short_description);
        let features: Vec<String> = service.features.iter().map(|s| s.to_string()).collect();
        let benefits: Vec<String> = service.benefits.iter().map(|s| s.to_string()).collect();
        let process: Vec<String> = service.process.iter().map(|s| s.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO services (title, slug, short_description, long_description, icon_path,
                                  features, benefits, process, is_active, display_order,
                                  meta_title, meta_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, $9, $10, $11)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(service.title)
        .bind(seo::slugify(service.title))
        .bind(service.short_description)
        .bind(service.long_description)
        .bind(service.icon_path)
        .bind(sqlx::types::Json(features))
        .bind(sqlx::types::Json(benefits))
        .bind(sqlx::types::Json(process))
        .bind(service.display_order)
        .bind(&meta.title)
        .bind(&meta.description)
        .execute(pool)
        .await?;
    }

    // One junction row per (city, service) pair, with derived metadata and no
    // override content. Operators customize individual pages later.
    let pairs: Vec<(String, String, String, String)> = {
        let mut out = Vec::new();
        for city in CITIES {
            for service in SERVICES {
                let meta = seo::city_service_meta(service.title, city.name);
                out.push((
                    seo::slugify(city.name),
                    seo::slugify(service.title),
                    meta.title,
                    meta.description,
                ));
            }
        }
        out
    };

    for (city_slug, service_slug, meta_title, meta_description) in &pairs {
        sqlx::query(
            r#"
            INSERT INTO city_services (city_id, service_id, meta_title, meta_description, is_active)
            SELECT c.id, s.id, $3, $4, true
            FROM cities c, services s
            WHERE c.slug = $1 AND s.slug = $2
            ON CONFLICT (city_id, service_id) DO NOTHING
            "#,
        )
        .bind(city_slug)
        .bind(service_slug)
        .bind(meta_title)
        .bind(meta_description)
        .execute(pool)
        .await?;
    }

    tracing::info!(
        cities = CITIES.len(),
        services = SERVICES.len(),
        pages = pairs.len(),
        "Seed data loaded"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_slugs_are_unique_and_valid() {
        let mut seen = std::collections::HashSet::new();
        for city in CITIES {
            let slug = seo::slugify(city.name);
            assert!(seo::is_valid_slug(&slug));
            assert!(seen.insert(slug), "duplicate city slug for {}", city.name);
        }
        seen.clear();
        for service in SERVICES {
            let slug = seo::slugify(service.title);
            assert!(seo::is_valid_slug(&slug));
            assert!(seen.insert(slug), "duplicate service slug");
        }
    }

    #[test]
    fn test_seed_services_carry_ordered_lists() {
        for service in SERVICES {
            assert!(!service.features.is_empty());
            assert!(!service.benefits.is_empty());
            assert!(!service.process.is_empty());
            assert!(service.display_order > 0);
        }
    }
}
