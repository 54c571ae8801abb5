//! Axum route handlers for the Jobs API.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::jobs::queries::{
    applications_for_job, category_counts, count_active_jobs, deactivate_job, find_job,
    insert_job, list_active_jobs, update_job, ApplicationWithApplicant, JobChanges, JobFilter,
    NewJob, Pagination,
};
use crate::models::job::{CategoryCount, JobRow};
use crate::models::user::Role;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub q: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRow>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub job: JobRow,
    pub applications: Vec<ApplicationWithApplicant>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    trimmed(value).ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Blank strings are treated as "not provided" so a PATCH cannot wipe a
/// required column.
fn into_changes(request: UpdateJobRequest) -> JobChanges {
    JobChanges {
        title: trimmed(request.title),
        company: trimmed(request.company),
        description: trimmed(request.description),
        location: trimmed(request.location),
        salary: trimmed(request.salary),
        category: trimmed(request.category),
        is_active: request.is_active,
    }
}

async fn load_owned_job(state: &AppState, auth: &AuthUser, id: Uuid) -> Result<JobRow, AppError> {
    auth.require_role(Role::Employer)?;

    let job = find_job(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    if job.created_by_id != Some(auth.user_id) {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/jobs
///
/// Active jobs, newest first, with optional text search and category filter.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListJobsQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let pagination = Pagination::new(query.page, query.limit);
    let filter = JobFilter {
        search: query.q,
        category: query.category,
    };

    let jobs = list_active_jobs(&state.db, &filter, pagination).await?;
    let total = count_active_jobs(&state.db, &filter).await?;

    Ok(Json(JobListResponse {
        jobs,
        pagination: PaginationInfo {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: pagination.total_pages(total),
        },
    }))
}

/// GET /api/jobs/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let categories = category_counts(&state.db).await?;
    Ok(Json(CategoryListResponse { categories }))
}

/// POST /api/jobs
///
/// Employers only.
pub async fn handle_create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    auth.require_role(Role::Employer)?;

    let title = required(request.title, "title")?;
    let company = required(request.company, "company")?;
    let description = required(request.description, "description")?;
    let location = trimmed(request.location);
    let salary = trimmed(request.salary);
    let category = trimmed(request.category);

    let job = insert_job(
        &state.db,
        NewJob {
            title: &title,
            company: &company,
            description: &description,
            location: location.as_deref(),
            salary: salary.as_deref(),
            category: category.as_deref(),
            created_by_id: auth.user_id,
        },
    )
    .await?;

    info!(job_id = %job.id, user_id = %auth.user_id, "job created");

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs/:id
///
/// The job with every application and its applicant's name and email.
pub async fn handle_get_job(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job = find_job(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let applications = applications_for_job(&state.db, id).await?;

    Ok(Json(JobDetailResponse { job, applications }))
}

/// PATCH /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    load_owned_job(&state, &auth, id).await?;

    let job = update_job(&state.db, id, &into_changes(request)).await?;

    info!(job_id = %id, user_id = %auth.user_id, "job updated");
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
///
/// Soft delete: the job stays in the table with `is_active = false`.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> Result<StatusCode, AppError> {
    load_owned_job(&state, &auth, id).await?;

    deactivate_job(&state.db, id).await?;

    info!(job_id = %id, user_id = %auth.user_id, "job deactivated");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        let err = required(Some("   ".to_string()), "title").unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "title is required"));
        assert_eq!(required(Some(" Dev ".into()), "title").unwrap(), "Dev");
    }

    #[test]
    fn test_update_ignores_blank_fields() {
        let changes = into_changes(UpdateJobRequest {
            title: Some("".to_string()),
            company: None,
            description: Some(" New description ".to_string()),
            location: None,
            salary: Some("  ".to_string()),
            category: None,
            is_active: Some(false),
        });
        assert!(changes.title.is_none());
        assert!(changes.salary.is_none());
        assert_eq!(changes.description.as_deref(), Some("New description"));
        assert_eq!(changes.is_active, Some(false));
    }

    #[test]
    fn test_update_request_reads_camel_case() {
        let request: UpdateJobRequest =
            serde_json::from_value(serde_json::json!({"isActive": true})).unwrap();
        assert_eq!(request.is_active, Some(true));
    }
}
