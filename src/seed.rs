//! One-shot bulk load of the fixed portfolio content. Destructive: the
//! projects, experiences and expertise collections are cleared first, so
//! running it twice leaves exactly one copy of each record.

use chrono::{Duration, SubsecRound};
use mockable::Clock;
use serde::Serialize;

use crate::db::models::{Experience, ExperienceLevel, Project, TechnicalExpertise};
use crate::db::{init_database, Collection, DocumentStore, StoreError};

/// Per-collection counts from one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub projects: u64,
    pub experiences: u64,
    pub technical_expertise: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: SeedCounts,
    /// Collection sizes re-counted after the load.
    pub verified: SeedCounts,
}

pub async fn seed_database(store: &dyn DocumentStore, clock: &dyn Clock) -> Result<SeedReport, StoreError> {
    tracing::info!("Initializing database...");
    init_database(store).await;

    tracing::info!("Clearing existing data...");
    for collection in [
        Collection::Projects,
        Collection::Experiences,
        Collection::TechnicalExpertise,
    ] {
        let removed = store.delete_all(collection).await?;
        tracing::debug!(collection = %collection, removed, "Cleared collection");
    }

    let inserted = SeedCounts {
        projects: insert_all(store, Collection::Projects, projects(clock)).await?,
        experiences: insert_all(store, Collection::Experiences, experiences()).await?,
        technical_expertise: insert_all(store, Collection::TechnicalExpertise, technical_expertise())
            .await?,
    };
    tracing::info!("Database seeding completed successfully");

    let verified = SeedCounts {
        projects: store.count(Collection::Projects).await?,
        experiences: store.count(Collection::Experiences).await?,
        technical_expertise: store.count(Collection::TechnicalExpertise).await?,
    };
    tracing::info!(
        projects = verified.projects,
        experiences = verified.experiences,
        expertise = verified.technical_expertise,
        "Verification"
    );

    Ok(SeedReport { inserted, verified })
}

async fn insert_all<T: Serialize>(
    store: &dyn DocumentStore,
    collection: Collection,
    records: Vec<T>,
) -> Result<u64, StoreError> {
    if records.is_empty() {
        return Ok(0);
    }
    let docs = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(collection = %collection, "Inserting {} records", docs.len());
    let written = store.insert_many(collection, docs).await?;
    tracing::info!(collection = %collection, written, "Inserted records");
    Ok(written)
}

// ============================================================================
// Fixed content
// ============================================================================

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Each project reads the clock as it is built, so later entries are newer.
pub fn projects(clock: &dyn Clock) -> Vec<Project> {
    let mut projects = vec![
        Project {
            id: "telus-faq-optimization".to_string(),
            title: "TELUS FAQ Optimization with Playbooks".to_string(),
            description: "Led POC implementation replacing SMS-based FAQ flows with dynamic Dialogflow CX Playbooks for improved customer experience.".to_string(),
            detailed_description: Some("Transitioned from static SMS troubleshooting responses to dynamic Playbooks that index TELUS website data. Implemented adversarial blockers to improve response accuracy and reduce off-topic answers. Focus on Smart Home Security (SHS) intents with higher volume questions.".to_string()),
            technologies: strings(&["Dialogflow CX", "Playbooks", "Data Store", "LLM Integration"]),
            category: "Conversational AI".to_string(),
            status: "Production".to_string(),
            impact: Some("Significantly improved containment rates and customer satisfaction".to_string()),
            client: Some("TELUS".to_string()),
            duration: Some("6 months".to_string()),
            team_size: Some(8),
            role: Some("Lead Conversational Architect".to_string()),
            challenges: Some(strings(&[
                "SMS-based responses caused customer frustration",
                "Low containment rates with existing FAQ flows",
                "Need for dynamic, accurate responses to complex queries",
            ])),
            solutions: Some(strings(&[
                "Implemented Playbooks with TELUS website data indexing",
                "Added adversarial blockers for response accuracy",
                "Created modular, scalable flow architecture",
            ])),
            created_at: clock.utc().trunc_subsecs(6),
        },
        Project {
            id: "burger-king-ai-drive-thru".to_string(),
            title: "Burger King AI Drive-Thru Automation".to_string(),
            description: "Pioneered Vertex AI Playbooks implementation creating dynamic conversational agents for personalized drive-thru experiences.".to_string(),
            detailed_description: Some("First-of-its-kind implementation of Vertex AI Playbooks for quick-service restaurant automation. Created intelligent conversational agents that personalize customer experiences based on order history and preferences.".to_string()),
            technologies: strings(&["Vertex AI Playbooks", "Dialogflow CX", "CCAI", "Node.js"]),
            category: "Conversational AI".to_string(),
            status: "Production".to_string(),
            impact: Some("Increased engagement and operational efficiency in drive-thru service".to_string()),
            client: Some("Burger King".to_string()),
            duration: Some("8 months".to_string()),
            team_size: Some(12),
            role: Some("Senior Conversational Architect".to_string()),
            challenges: Some(strings(&[
                "Real-time order processing requirements",
                "Integration with existing POS systems",
                "Handling complex menu variations and customizations",
            ])),
            solutions: Some(strings(&[
                "Vertex AI Playbooks for dynamic conversation management",
                "Seamless POS integration with real-time data sync",
                "Context-aware menu handling with preference learning",
            ])),
            created_at: clock.utc().trunc_subsecs(6),
        },
        Project {
            id: "nysd-healthcare-automation".to_string(),
            title: "NYSD Healthcare Documentation Automation".to_string(),
            description: "High-impact project leveraging Dialogflow's advanced AI to automate health documentation processing for New York State Department.".to_string(),
            detailed_description: Some("Enterprise-scale healthcare automation system processing complex documentation workflows. Implemented advanced AI capabilities to streamline health document processing, resulting in significant time savings and accuracy improvements.".to_string()),
            technologies: strings(&["Dialogflow CX", "Healthcare APIs", "Google Cloud", "Python"]),
            category: "Healthcare AI".to_string(),
            status: "Completed".to_string(),
            impact: Some("Faster turnaround times and enhanced data accuracy for state health documentation".to_string()),
            client: Some("New York State Department".to_string()),
            duration: Some("12 months".to_string()),
            team_size: Some(15),
            role: Some("Lead AI Architect".to_string()),
            challenges: Some(strings(&[
                "Complex healthcare documentation requirements",
                "HIPAA compliance and data security",
                "Integration with legacy state systems",
            ])),
            solutions: Some(strings(&[
                "Advanced Dialogflow CX workflows for document processing",
                "Secure healthcare API integration with compliance measures",
                "Legacy system integration with modern AI capabilities",
            ])),
            created_at: clock.utc().trunc_subsecs(6),
        },
        Project {
            id: "comcast-multi-flow-architecture".to_string(),
            title: "Comcast Multi-Flow CX Architecture".to_string(),
            description: "Managed 25+ Dialogflow CX flows in complex multi-team environment with integrated backend systems and real-time support.".to_string(),
            detailed_description: Some("Comprehensive conversational AI architecture handling multiple customer service scenarios. Integrated Comcast backend APIs, Spanner database, and session parameters for personalized customer experiences. Provided live debugging support during customer interactions.".to_string()),
            technologies: strings(&["Dialogflow CX", "Spanner", "Backend APIs", "Session Management"]),
            category: "Enterprise AI".to_string(),
            status: "Production".to_string(),
            impact: Some("Streamlined customer service operations across multiple departments".to_string()),
            client: Some("Comcast".to_string()),
            duration: Some("18 months".to_string()),
            team_size: Some(20),
            role: Some("Conversational Architect".to_string()),
            challenges: Some(strings(&[
                "Managing 25+ interconnected flows",
                "Real-time debugging during live customer sessions",
                "Complex integration with multiple backend systems",
            ])),
            solutions: Some(strings(&[
                "Modular flow architecture with reusable components",
                "Comprehensive logging and debugging infrastructure",
                "Seamless backend integration with error handling",
            ])),
            created_at: clock.utc().trunc_subsecs(6),
        },
    ];
    strictly_increasing(&mut projects);
    projects
}

/// Consecutive clock reads can land in the same microsecond; nudge ties
/// forward so newest-first order matches seed order.
fn strictly_increasing(projects: &mut [Project]) {
    for i in 1..projects.len() {
        let floor = projects[i - 1].created_at + Duration::microseconds(1);
        if projects[i].created_at < floor {
            projects[i].created_at = floor;
        }
    }
}

pub fn experiences() -> Vec<Experience> {
    vec![
        Experience {
            id: "capgemini-ccai-engineer".to_string(),
            company: "Capgemini".to_string(),
            role: "CCAI Engineer".to_string(),
            period: "Nov 2024 - Present".to_string(),
            location: "Los Angeles, CA".to_string(),
            achievements: strings(&[
                "Collaborated with client POs to coordinate API development for Dialogflow CX flows",
                "Managed daily syncs with Apigee and API teams to track progress and address blockers",
                "Optimized high-volume FAQ flows to improve containment rates and reduce agent escalations",
                "Developed Dialogflow CX voice bot flows integrated with CCAI Platform (CCAIP)",
                "Implemented caller classification scripts using system functions for accurate routing",
            ]),
            detailed_responsibilities: Some(strings(&[
                "API coordination and request management with TELUS Product Owners",
                "Daily tracking and follow-up with Apigee and API development teams",
                "Containment rate optimization for FAQ flows using Playbooks POC",
                "Voice bot development with ANI, DNIS, and UUI integration",
            ])),
            technologies_used: Some(strings(&[
                "Dialogflow CX",
                "CCAI Platform",
                "Apigee X",
                "Voice Bot Development",
            ])),
            team_leadership: true,
            key_projects: Some(strings(&[
                "TELUS FAQ Optimization",
                "Voice Bot Integration",
                "API Coordination",
            ])),
        },
        Experience {
            id: "quantiphi-sr-engineer".to_string(),
            company: "Quantiphi Inc (Google Project)".to_string(),
            role: "Sr. Software Engineer & Conversational Architect".to_string(),
            period: "Feb 2021 - Nov 2024".to_string(),
            location: "Los Angeles, CA".to_string(),
            achievements: strings(&[
                "Led Apigee team while serving as Conversational Architect on Google projects",
                "Pioneered Vertex AI Playbooks implementation for Burger King drive-thru automation",
                "Architected high-impact NYSD project leveraging Dialogflow's advanced AI capabilities",
                "Enhanced Jenkins pipeline to support Playbooks using dfcx-scrapi",
                "Designed RESTful APIs with OpenAPI specifications for healthcare data integration",
            ]),
            detailed_responsibilities: Some(strings(&[
                "Team leadership and cross-functional collaboration with Dialog Designers",
                "Weekly QA sessions and code reviews for quality assurance",
                "Conversation log analysis with Data Engineers for model improvement",
                "Cloud AI Engineers collaboration for seamless backend integration",
            ])),
            technologies_used: Some(strings(&[
                "Vertex AI Playbooks",
                "Dialogflow CX/ES",
                "Node.js",
                "TypeScript",
                "MongoDB",
                "BigQuery",
                "Cloud Functions",
                "Terraform",
                "Jenkins",
            ])),
            team_leadership: true,
            key_projects: Some(strings(&[
                "Burger King AI Drive-Thru",
                "NYSD Healthcare Automation",
                "Enterprise CCAI Platform",
                "Healthcare Data Engine Integration",
            ])),
        },
    ]
}

pub fn technical_expertise() -> Vec<TechnicalExpertise> {
    vec![
        TechnicalExpertise {
            id: "conversational-ai-architecture".to_string(),
            category: "Conversational AI Architecture".to_string(),
            title: "Advanced Dialogflow CX Implementation".to_string(),
            description: "Expert-level design and implementation of complex conversational flows with state management, context switching, and advanced NLU capabilities. Specialized in enterprise-scale CCAI solutions with proven track record of improving containment rates.".to_string(),
            technologies: strings(&[
                "Dialogflow CX",
                "Intent Management",
                "Entity Extraction",
                "Context Handling",
                "Flow Design",
            ]),
            experience_level: ExperienceLevel::Expert,
            years_experience: Some(4),
        },
        TechnicalExpertise {
            id: "telephony-voice-integration".to_string(),
            category: "Telephony & Voice Integration".to_string(),
            title: "CCAI Platform & Voice Bot Development".to_string(),
            description: "Specialized in telephony integration using SIP protocols, handling ANI/DNIS/UUI metadata, and voice bot development for enterprise contact centers. Expert in CCAI Platform integration and real-time voice processing.".to_string(),
            technologies: strings(&[
                "CCAI Platform",
                "SIP Integration",
                "Voice Bots",
                "Telephony Metadata",
                "ANI/DNIS/UUI",
            ]),
            experience_level: ExperienceLevel::Expert,
            years_experience: Some(3),
        },
        TechnicalExpertise {
            id: "api-architecture-integration".to_string(),
            category: "API Architecture & Integration".to_string(),
            title: "Enterprise API Design & Backend Integration".to_string(),
            description: "Extensive experience in RESTful API design, backend system integration, and managing complex data flows between conversational AI and enterprise systems. Led Apigee team coordination and API request management.".to_string(),
            technologies: strings(&[
                "RESTful APIs",
                "Apigee X",
                "Backend Integration",
                "Database Management",
                "OpenAPI",
            ]),
            experience_level: ExperienceLevel::Advanced,
            years_experience: Some(4),
        },
        TechnicalExpertise {
            id: "devops-deployment".to_string(),
            category: "DevOps & Deployment".to_string(),
            title: "CI/CD Pipeline Management".to_string(),
            description: "Enhanced Jenkins pipelines for Dialogflow CX deployments, including Playbooks support using dfcx-scrapi. Comprehensive environment management across lab, dev, non-prod, and production environments.".to_string(),
            technologies: strings(&[
                "Jenkins",
                "dfcx-scrapi",
                "CI/CD",
                "Environment Management",
                "Deployment Automation",
            ]),
            experience_level: ExperienceLevel::Advanced,
            years_experience: Some(3),
        },
    ]
}
