//! Read-only portfolio content: projects, experience, expertise and stats.

use serde_json::Value;

use super::{decode_all, store_failure};
use crate::db::models::{Experience, PortfolioStats, Project, TechnicalExpertise};
use crate::db::{Collection, FindOptions, SharedStore, StoreError};
use crate::error::ApiError;

/// Fixed figures reported by the stats endpoint. These describe this
/// deployment's owner and are not derived from stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentProfile {
    pub years_experience: u32,
    pub google_projects: String,
    pub specialization: String,
}

impl Default for DeploymentProfile {
    fn default() -> Self {
        Self {
            years_experience: 4,
            google_projects: "10+".to_string(),
            specialization: "CCAI & Dialogflow CX".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct PortfolioService {
    store: SharedStore,
    profile: DeploymentProfile,
}

impl PortfolioService {
    pub fn new(store: SharedStore, profile: DeploymentProfile) -> Self {
        Self { store, profile }
    }

    /// Newest first, optionally restricted to one category.
    pub async fn list_projects(&self, category: Option<&str>, limit: u64) -> Result<Vec<Project>, ApiError> {
        let mut options = FindOptions::new().sort_desc("created_at").limit(limit);
        if let Some(category) = category {
            options = options.filter_eq("category", category);
        }

        let docs = self
            .store
            .find(Collection::Projects, options)
            .await
            .map_err(store_failure("Error fetching projects"))?;
        decode_all(docs).map_err(store_failure("Error decoding projects"))
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        let doc = self
            .store
            .find_by_id(Collection::Projects, id)
            .await
            .map_err(store_failure("Error fetching project"))?
            .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

        serde_json::from_value(doc)
            .map_err(StoreError::from)
            .map_err(store_failure("Error decoding project"))
    }

    /// Ordered by the stored `period` string, descending.
    pub async fn list_experience(&self) -> Result<Vec<Experience>, ApiError> {
        let docs = self
            .store
            .find(Collection::Experiences, FindOptions::new().sort_desc("period"))
            .await
            .map_err(store_failure("Error fetching experience"))?;
        decode_all(docs).map_err(store_failure("Error decoding experience"))
    }

    pub async fn list_expertise(&self, category: Option<&str>) -> Result<Vec<TechnicalExpertise>, ApiError> {
        let mut options = FindOptions::new();
        if let Some(category) = category {
            options = options.filter_eq("category", category);
        }

        let docs = self
            .store
            .find(Collection::TechnicalExpertise, options)
            .await
            .map_err(store_failure("Error fetching technical expertise"))?;
        decode_all(docs).map_err(store_failure("Error decoding technical expertise"))
    }

    pub async fn stats(&self) -> Result<PortfolioStats, ApiError> {
        self.collect_stats()
            .await
            .map_err(store_failure("Error fetching portfolio stats"))
    }

    async fn collect_stats(&self) -> Result<PortfolioStats, StoreError> {
        let total_projects = self.store.count(Collection::Projects).await?;
        let total_experience_entries = self.store.count(Collection::Experiences).await?;
        let total_expertise_areas = self.store.count(Collection::TechnicalExpertise).await?;
        let project_categories = self
            .store
            .distinct(Collection::Projects, "category")
            .await?
            .into_iter()
            .filter_map(|value| match value {
                Value::String(category) => Some(category),
                _ => None,
            })
            .collect();

        Ok(PortfolioStats {
            total_projects,
            total_experience_entries,
            total_expertise_areas,
            project_categories,
            years_experience: self.profile.years_experience,
            google_projects: self.profile.google_projects.clone(),
            specialization: self.profile.specialization.clone(),
        })
    }
}
