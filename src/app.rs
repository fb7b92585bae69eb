use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/select/:fragment", get(handlers::follow_fragment))
        .route("/habits", post(handlers::create_habit))
        .route("/habits/:id/select", post(handlers::select_habit))
        .route("/habits/:id/delete", post(handlers::delete_habit))
        .route("/habits/:id/days", post(handlers::add_day))
        .route("/habits/:id/days/:index/delete", post(handlers::delete_day))
        .route("/icon/:tag", post(handlers::pick_icon))
        .route("/popup/toggle", post(handlers::toggle_popup))
        .route("/api/state", get(handlers::get_state))
        .route("/api/habits", post(handlers::create_habit_json))
        .with_state(state)
}
