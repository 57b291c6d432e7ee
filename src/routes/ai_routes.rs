use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::ai_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/ai/chat", post(ai_controller::post_chat))
        .route("/ai/summary", get(ai_controller::get_summary))
        .route("/ai/summary/latest", get(ai_controller::get_latest_summary))
        .route("/ai/summary/generate", post(ai_controller::post_generate_summary))
}
