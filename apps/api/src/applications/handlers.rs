//! Axum route handlers for job applications.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::pdf::{extract_pdf_text, has_pdf_magic, is_pdf_content_type, MAX_PDF_BYTES};
use crate::applications::queries::{
    applications_for_user, insert_application, ApplicationWithJob, NewApplication,
};
use crate::applications::screening::screen_or_fallback;
use crate::applications::storage::{cv_object_key, remove_orphaned_cv, upload_cv};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::MultipartForm;
use crate::jobs::queries::find_job;
use crate::models::application::ApplicationRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationWithJob>,
}

#[derive(Debug)]
struct CvUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl CvUpload {
    fn is_pdf(&self) -> bool {
        is_pdf_content_type(Some(&self.content_type)) || has_pdf_magic(&self.bytes)
    }
}

/// Reads the `jobId` and `cv` fields. Other fields are ignored.
async fn read_application_form(
    mut multipart: Multipart,
) -> Result<(Option<String>, Option<CvUpload>), AppError> {
    let mut job_id = None;
    let mut cv = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("jobId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid jobId field: {e}")))?;
                job_id = Some(text);
            }
            Some("cv") => {
                let file_name = field.file_name().unwrap_or("cv").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid cv field: {e}")))?;
                cv = Some(CvUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok((job_id, cv))
}

fn validate_application_form(
    job_id: Option<String>,
    cv: Option<CvUpload>,
) -> Result<(Uuid, CvUpload), AppError> {
    let job_id = job_id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty());
    let cv = cv.filter(|cv| !cv.bytes.is_empty());

    let (Some(job_id), Some(cv)) = (job_id, cv) else {
        return Err(AppError::Validation("Job ID and CV are required".to_string()));
    };

    let job_id = Uuid::parse_str(&job_id)
        .map_err(|_| AppError::Validation("Invalid job ID".to_string()))?;

    if cv.bytes.len() > MAX_PDF_BYTES {
        return Err(AppError::Validation("File too large (max 10MB)".to_string()));
    }

    Ok((job_id, cv))
}

async fn cv_text(cv: &CvUpload) -> Result<String, AppError> {
    if cv.is_pdf() {
        extract_pdf_text(cv.bytes.clone()).await
    } else {
        Ok(String::from_utf8_lossy(&cv.bytes).into_owned())
    }
}

/// POST /api/applications
///
/// Stores the CV, screens it against the job description and records the
/// application with its score and feedback.
pub async fn handle_create_application(
    State(state): State<AppState>,
    auth: AuthUser,
    MultipartForm(multipart): MultipartForm,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let (job_id, cv) = read_application_form(multipart).await?;
    let (job_id, cv) = validate_application_form(job_id, cv)?;

    let job = find_job(&state.db, job_id)
        .await?
        .filter(|job| job.is_active)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let text = cv_text(&cv).await?;

    let key = cv_object_key(auth.user_id, &cv.file_name);
    upload_cv(&state.s3, &state.config.s3_bucket, &key, &cv.content_type, cv.bytes).await?;

    let screening = screen_or_fallback(state.screener.as_ref(), &text, &job.description).await;
    let stored = match serde_json::to_value(&screening) {
        Ok(feedback) => {
            insert_application(
                &state.db,
                NewApplication {
                    user_id: auth.user_id,
                    job_id,
                    cv_url: &key,
                    ai_score: i32::from(screening.score),
                    ai_feedback: feedback,
                },
            )
            .await
            .map_err(AppError::from)
        }
        Err(e) => Err(AppError::Internal(e.into())),
    };

    // The upload already happened; do not leave its object behind.
    let application = match stored {
        Ok(application) => application,
        Err(e) => {
            remove_orphaned_cv(&state.s3, &state.config.s3_bucket, &key).await;
            return Err(e);
        }
    };

    info!(
        application_id = %application.id,
        job_id = %job_id,
        user_id = %auth.user_id,
        score = screening.score,
        screener = %screening.screener,
        "application submitted"
    );

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let applications = applications_for_user(&state.db, auth.user_id).await?;
    Ok(Json(ApplicationListResponse { applications }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(bytes: &[u8]) -> CvUpload {
        CvUpload {
            file_name: "cv.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(m) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_rejected() {
        let err = validate_application_form(None, Some(upload(b"cv"))).unwrap_err();
        assert_eq!(validation_message(err), "Job ID and CV are required");

        let id = Uuid::new_v4().to_string();
        let err = validate_application_form(Some(id.clone()), None).unwrap_err();
        assert_eq!(validation_message(err), "Job ID and CV are required");

        let err = validate_application_form(Some(id), Some(upload(b""))).unwrap_err();
        assert_eq!(validation_message(err), "Job ID and CV are required");
    }

    #[test]
    fn test_non_uuid_job_id_rejected() {
        let err = validate_application_form(Some("42".into()), Some(upload(b"cv"))).unwrap_err();
        assert_eq!(validation_message(err), "Invalid job ID");
    }

    #[test]
    fn test_valid_form_passes_through() {
        let id = Uuid::new_v4();
        let (job_id, cv) =
            validate_application_form(Some(format!(" {id} ")), Some(upload(b"Rust dev"))).unwrap();
        assert_eq!(job_id, id);
        assert_eq!(cv.bytes, b"Rust dev");
    }

    #[test]
    fn test_pdf_detection_uses_type_or_magic() {
        assert!(!upload(b"plain text").is_pdf());
        assert!(upload(b"%PDF-1.7 ...").is_pdf());

        let mut typed = upload(b"whatever");
        typed.content_type = "application/pdf".to_string();
        assert!(typed.is_pdf());
    }

    #[tokio::test]
    async fn test_text_cv_is_read_as_utf8() {
        let text = cv_text(&upload("Sari, backend engineer, Rust".as_bytes())).await.unwrap();
        assert_eq!(text, "Sari, backend engineer, Rust");
    }
}
