use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::application::ApplicationRow;
use crate::models::job::{Applicant, CategoryCount, JobRow};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page/limit pair after clamping. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Saturates: a huge page number asks for an offset past every row.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl JobFilter {
    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }

    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const ACTIVE_FILTER: &str = r#"
    is_active = TRUE
    AND ($1::text IS NULL
         OR title ILIKE $1 OR company ILIKE $1 OR COALESCE(location, '') ILIKE $1)
    AND ($2::text IS NULL OR category = $2)
"#;

pub async fn list_active_jobs(
    pool: &PgPool,
    filter: &JobFilter,
    pagination: Pagination,
) -> Result<Vec<JobRow>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM jobs WHERE {ACTIVE_FILTER} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    );
    sqlx::query_as::<_, JobRow>(&sql)
        .bind(filter.search_pattern())
        .bind(filter.category())
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(pool)
        .await
}

pub async fn count_active_jobs(pool: &PgPool, filter: &JobFilter) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM jobs WHERE {ACTIVE_FILTER}");
    sqlx::query_scalar(&sql)
        .bind(filter.search_pattern())
        .bind(filter.category())
        .fetch_one(pool)
        .await
}

pub async fn category_counts(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
    sqlx::query_as::<_, CategoryCount>(
        r#"
        SELECT category, COUNT(*) AS count
        FROM jobs
        WHERE is_active = TRUE AND category IS NOT NULL AND category <> ''
        GROUP BY category
        ORDER BY category
        "#,
    )
    .fetch_all(pool)
    .await
}

pub struct NewJob<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub salary: Option<&'a str>,
    pub category: Option<&'a str>,
    pub created_by_id: Uuid,
}

pub async fn insert_job(pool: &PgPool, job: NewJob<'_>) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (id, title, company, description, location, salary, category, source, created_by_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'CUSTOM', $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job.title)
    .bind(job.company)
    .bind(job.description)
    .bind(job.location)
    .bind(job.salary)
    .bind(job.category)
    .bind(job.created_by_id)
    .fetch_one(pool)
    .await
}

pub async fn find_job(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Fields left `None` keep their stored value.
#[derive(Debug, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_job(
    pool: &PgPool,
    id: Uuid,
    changes: &JobChanges,
) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET
            title       = COALESCE($2, title),
            company     = COALESCE($3, company),
            description = COALESCE($4, description),
            location    = COALESCE($5, location),
            salary      = COALESCE($6, salary),
            category    = COALESCE($7, category),
            is_active   = COALESCE($8, is_active),
            updated_at  = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.company.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.location.as_deref())
    .bind(changes.salary.as_deref())
    .bind(changes.category.as_deref())
    .bind(changes.is_active)
    .fetch_one(pool)
    .await
}

pub async fn deactivate_job(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct ApplicantJoinRow {
    id: Uuid,
    user_id: Uuid,
    job_id: Uuid,
    cv_url: String,
    ai_score: Option<i32>,
    ai_feedback: Option<Value>,
    created_at: DateTime<Utc>,
    applicant_name: Option<String>,
    applicant_email: String,
}

/// An application on a job's detail page, with the applicant embedded.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationWithApplicant {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub user: Applicant,
}

impl From<ApplicantJoinRow> for ApplicationWithApplicant {
    fn from(row: ApplicantJoinRow) -> Self {
        Self {
            application: ApplicationRow {
                id: row.id,
                user_id: row.user_id,
                job_id: row.job_id,
                cv_url: row.cv_url,
                ai_score: row.ai_score,
                ai_feedback: row.ai_feedback,
                created_at: row.created_at,
            },
            user: Applicant {
                name: row.applicant_name,
                email: row.applicant_email,
            },
        }
    }
}

pub async fn applications_for_job(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<ApplicationWithApplicant>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ApplicantJoinRow>(
        r#"
        SELECT a.id, a.user_id, a.job_id, a.cv_url, a.ai_score, a.ai_feedback, a.created_at,
               u.name AS applicant_name, u.email AS applicant_email
        FROM applications a
        JOIN users u ON u.id = a.user_id
        WHERE a.job_id = $1
        ORDER BY a.ai_score DESC NULLS LAST, a.created_at DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::new(None, None);
        assert_eq!(p, Pagination { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps_out_of_range_values() {
        let p = Pagination::new(Some(0), Some(500));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, MAX_PAGE_SIZE);

        let p = Pagination::new(Some(-3), Some(0));
        assert_eq!(p, Pagination { page: 1, limit: 1 });
    }

    #[test]
    fn test_pagination_offset_saturates_for_huge_pages() {
        let p = Pagination::new(Some(i64::MAX), Some(10));
        assert_eq!(p.offset(), i64::MAX);

        let p = Pagination::new(Some(i64::MAX / 50), Some(MAX_PAGE_SIZE));
        assert_eq!(p.offset(), i64::MAX);
    }

    #[test]
    fn test_pagination_offset_and_total_pages() {
        let p = Pagination::new(Some(3), Some(10));
        assert_eq!(p.offset(), 20);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(21), 3);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = JobFilter {
            search: Some("  100%_remote ".to_string()),
            category: Some("   ".to_string()),
        };
        assert_eq!(filter.search_pattern().as_deref(), Some("%100\\%\\_remote%"));
        assert_eq!(filter.category(), None);
    }

    #[test]
    fn test_empty_filter_binds_nulls() {
        let filter = JobFilter::default();
        assert!(filter.search_pattern().is_none());
        assert!(filter.category().is_none());
    }
}
