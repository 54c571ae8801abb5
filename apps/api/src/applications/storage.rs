use aws_sdk_s3::primitives::ByteStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

const MAX_FILE_NAME_CHARS: usize = 100;

/// S3 key for an uploaded CV: `cvs/<user>/<uuid>-<sanitized name>`.
pub fn cv_object_key(user_id: Uuid, file_name: &str) -> String {
    format!("cvs/{}/{}-{}", user_id, Uuid::new_v4(), sanitize_file_name(file_name))
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
fn sanitize_file_name(name: &str) -> String {
    // Browsers on Windows may send the full client path.
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILE_NAME_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "cv".to_string()
    } else {
        cleaned.to_string()
    }
}

pub async fn upload_cv(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("CV upload failed: {e}")))?;

    info!("Uploaded CV to s3://{}/{}", bucket, key);
    Ok(())
}

/// Deletes a CV whose application row was never written. Returns whether the
/// object is gone; on failure the key is logged so it can be removed by hand.
pub async fn remove_orphaned_cv(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) -> bool {
    match s3.delete_object().bucket(bucket).key(key).send().await {
        Ok(_) => {
            warn!(bucket, key, "removed CV of unsaved application");
            true
        }
        Err(e) => {
            warn!(bucket, key, error = %e, "orphaned CV left in bucket");
            false
        }
    }
}
