// Route definitions

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::AppState;

mod api;
mod pages;

pub fn create_router(app_state: AppState) -> Router {
    // JSON API: the controller's read-only view plus its four operations
    let api_router = Router::new()
        .route("/makes", get(api::get_makes))
        .route("/models/:make", get(api::get_models))
        .route("/sessions", post(api::create_session))
        .route("/sessions/:id", get(api::get_session))
        .route("/sessions/:id/search", post(api::submit_search))
        .route("/sessions/:id/sort", put(api::set_sort_key))
        .route(
            "/sessions/:id/selection",
            put(api::select_listing).delete(api::clear_selection),
        )
        .route("/sessions/:id/make", post(api::choose_make))
        .route("/sessions/:id/model", put(api::choose_model));

    // Server-rendered pages; forms post back and redirect to the page
    let page_router = Router::new()
        .route("/", get(pages::new_session))
        .route("/sessions/:id", get(pages::session_page))
        .route("/sessions/:id/search", post(pages::submit_search))
        .route("/sessions/:id/make", post(pages::choose_make))
        .route("/sessions/:id/sort", post(pages::set_sort_key))
        .route("/sessions/:id/selection", post(pages::select_listing))
        .route("/sessions/:id/selection/clear", post(pages::clear_selection));

    Router::new()
        .route("/health", get(api::health))
        .merge(page_router)
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
