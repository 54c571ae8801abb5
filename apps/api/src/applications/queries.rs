use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::application::ApplicationRow;
use crate::models::job::JobRow;

pub struct NewApplication<'a> {
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub cv_url: &'a str,
    pub ai_score: i32,
    pub ai_feedback: Value,
}

pub async fn insert_application(
    pool: &PgPool,
    application: NewApplication<'_>,
) -> Result<ApplicationRow, sqlx::Error> {
    sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (id, user_id, job_id, cv_url, ai_score, ai_feedback)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, job_id, cv_url, ai_score, ai_feedback, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(application.user_id)
    .bind(application.job_id)
    .bind(application.cv_url)
    .bind(application.ai_score)
    .bind(application.ai_feedback)
    .fetch_one(pool)
    .await
}

#[derive(Debug, FromRow)]
struct ApplicationJobJoinRow {
    id: Uuid,
    user_id: Uuid,
    job_id: Uuid,
    cv_url: String,
    ai_score: Option<i32>,
    ai_feedback: Option<Value>,
    created_at: DateTime<Utc>,
    job_title: String,
    job_company: String,
    job_description: String,
    job_location: Option<String>,
    job_salary: Option<String>,
    job_category: Option<String>,
    job_source: String,
    job_is_active: bool,
    job_created_by_id: Option<Uuid>,
    job_created_at: DateTime<Utc>,
    job_updated_at: DateTime<Utc>,
}

/// One of the caller's applications, with the job it was sent to.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationWithJob {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub job: JobRow,
}

impl From<ApplicationJobJoinRow> for ApplicationWithJob {
    fn from(row: ApplicationJobJoinRow) -> Self {
        Self {
            job: JobRow {
                id: row.job_id,
                title: row.job_title,
                company: row.job_company,
                description: row.job_description,
                location: row.job_location,
                salary: row.job_salary,
                category: row.job_category,
                source: row.job_source,
                is_active: row.job_is_active,
                created_by_id: row.job_created_by_id,
                created_at: row.job_created_at,
                updated_at: row.job_updated_at,
            },
            application: ApplicationRow {
                id: row.id,
                user_id: row.user_id,
                job_id: row.job_id,
                cv_url: row.cv_url,
                ai_score: row.ai_score,
                ai_feedback: row.ai_feedback,
                created_at: row.created_at,
            },
        }
    }
}

pub async fn applications_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ApplicationWithJob>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ApplicationJobJoinRow>(
        r#"
        SELECT a.id, a.user_id, a.job_id, a.cv_url, a.ai_score, a.ai_feedback, a.created_at,
               j.title AS job_title, j.company AS job_company,
               j.description AS job_description, j.location AS job_location,
               j.salary AS job_salary, j.category AS job_category, j.source AS job_source,
               j.is_active AS job_is_active, j.created_by_id AS job_created_by_id,
               j.created_at AS job_created_at, j.updated_at AS job_updated_at
        FROM applications a
        JOIN jobs j ON j.id = a.job_id
        WHERE a.user_id = $1
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
