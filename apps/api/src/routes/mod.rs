pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::chat::handlers as chat;
use crate::events::handlers as events;
use crate::jobs::handlers as jobs;
use crate::state::AppState;
use crate::videos::handlers as videos;

/// Room for a 10 MiB CV plus multipart framing.
pub const MAX_UPLOAD_BYTES: usize = 12 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/jobs/categories", get(jobs::handle_list_categories))
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Applications and CV review
        .route(
            "/api/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route("/api/analyze-cv", post(analysis::handle_analyze_cv))
        // Career chat
        .route(
            "/api/chat",
            post(chat::handle_chat)
                .get(chat::handle_get_history)
                .delete(chat::handle_clear_history),
        )
        // Calendar
        .route(
            "/api/events",
            get(events::handle_list_events).post(events::handle_create_event),
        )
        .route(
            "/api/events/:id",
            patch(events::handle_update_event).delete(events::handle_delete_event),
        )
        // Videos
        .route("/api/videos", get(videos::handle_list_videos))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
