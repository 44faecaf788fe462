/**
 * Portfolio Routes
 * Read-only endpoints for projects, experience, expertise and stats
 */
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::query_rejection;
use crate::db::models::{Experience, PortfolioStats, Project, TechnicalExpertise};
use crate::error::ApiError;
use crate::services::DEFAULT_LIMIT;
use crate::AppState;

/// Query parameters for GET /api/portfolio/projects
#[derive(Debug, Deserialize)]
pub struct ProjectsQuery {
    pub category: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

/// Query parameters for GET /api/portfolio/expertise
#[derive(Debug, Deserialize)]
pub struct ExpertiseQuery {
    pub category: Option<String>,
}

/// A blank `category` means no filter.
fn category_filter(category: Option<&str>) -> Option<&str> {
    category.filter(|c| !c.trim().is_empty())
}

/// GET /api/portfolio/projects?category=&limit=
pub async fn list_projects(
    State(state): State<AppState>,
    query: Result<Query<ProjectsQuery>, QueryRejection>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let Query(query) = query.map_err(query_rejection)?;
    let projects = state
        .portfolio
        .list_projects(category_filter(query.category.as_deref()), query.limit)
        .await?;
    Ok(Json(projects))
}

/// GET /api/portfolio/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.portfolio.get_project(&id).await?))
}

/// GET /api/portfolio/experience
pub async fn list_experience(State(state): State<AppState>) -> Result<Json<Vec<Experience>>, ApiError> {
    Ok(Json(state.portfolio.list_experience().await?))
}

/// GET /api/portfolio/expertise?category=
pub async fn list_expertise(
    State(state): State<AppState>,
    query: Result<Query<ExpertiseQuery>, QueryRejection>,
) -> Result<Json<Vec<TechnicalExpertise>>, ApiError> {
    let Query(query) = query.map_err(query_rejection)?;
    let expertise = state
        .portfolio
        .list_expertise(category_filter(query.category.as_deref()))
        .await?;
    Ok(Json(expertise))
}

/// GET /api/portfolio/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<PortfolioStats>, ApiError> {
    Ok(Json(state.portfolio.stats().await?))
}
