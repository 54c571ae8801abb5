use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::llm_client::openai::ChatMessage;
use crate::models::chat::ChatHistoryRow;

pub async fn find_history(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<ChatHistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, ChatHistoryRow>(
        "SELECT id, user_id, messages, created_at, updated_at FROM chat_histories WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Replaces the user's stored conversation, creating it on first use.
pub async fn upsert_history(
    pool: &PgPool,
    user_id: Uuid,
    messages: &[ChatMessage],
) -> Result<(), sqlx::Error> {
    let messages = sqlx::types::Json(messages);
    sqlx::query(
        r#"
        INSERT INTO chat_histories (id, user_id, messages)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id)
        DO UPDATE SET messages = EXCLUDED.messages, updated_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(messages)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns true when a stored conversation existed.
pub async fn delete_history(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM chat_histories WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Stored histories are written by this service, but rows from older
/// clients may hold entries of another shape; those are skipped.
pub fn stored_messages(messages: Value) -> Vec<ChatMessage> {
    match messages {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}
