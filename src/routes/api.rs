// Handlers for the JSON API

use std::sync::Arc;

use axum::{
    extract::{Json as JsonExtract, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState,
    error::{AppError, AppResult},
    filters::FilterForm,
    makes,
    session::{SearchSession, SessionView},
    sort::SortKey,
};

// --- Request / Response Structs ---

#[derive(Serialize)]
struct ModelsBody {
    make: String,
    models: Vec<String>,
}

#[derive(Serialize)]
struct CreatedSession {
    id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    sort_key: String,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    key: String,
}

#[derive(Deserialize)]
pub struct MakeRequest {
    #[serde(default)]
    make: String,
}

pub(super) async fn find_session(app_state: &AppState, id: u64) -> AppResult<Arc<SearchSession>> {
    app_state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No search session {}", id)))
}

// --- API Handlers ---

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

pub async fn get_makes() -> impl IntoResponse {
    Json(makes::all())
}

pub async fn get_models(
    State(app_state): State<AppState>,
    Path(make): Path<String>,
) -> AppResult<impl IntoResponse> {
    tracing::debug!(make = %make, "API call: get_models");
    let models = app_state.lookup.models_for_make(&make).await?;
    Ok(Json(ModelsBody { make, models }))
}

pub async fn create_session(State(app_state): State<AppState>) -> impl IntoResponse {
    let (id, _) = app_state.sessions.create().await;
    (StatusCode::CREATED, Json(CreatedSession { id }))
}

pub async fn get_session(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<SessionView>> {
    let session = find_session(&app_state, id).await?;
    Ok(Json(session.view().await))
}

pub async fn submit_search(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    JsonExtract(form): JsonExtract<FilterForm>,
) -> AppResult<impl IntoResponse> {
    let session = find_session(&app_state, id).await?;
    let filters = form.submit()?;
    tracing::info!(session = id, ?filters, "API call: submit_search");

    // The search runs in the background; clients poll the session view
    session.submit_search(&filters).await?;
    Ok((StatusCode::ACCEPTED, Json(session.view().await)))
}

pub async fn set_sort_key(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    JsonExtract(request): JsonExtract<SortRequest>,
) -> AppResult<Json<SessionView>> {
    let session = find_session(&app_state, id).await?;
    let key: SortKey = request
        .sort_key
        .parse()
        .map_err(|e: crate::sort::UnknownSortKey| AppError::BadRequest(e.to_string()))?;
    session.set_sort_key(key).await;
    Ok(Json(session.view().await))
}

pub async fn select_listing(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    JsonExtract(request): JsonExtract<SelectRequest>,
) -> AppResult<Json<SessionView>> {
    let session = find_session(&app_state, id).await?;
    if !session.select_listing(&request.key).await {
        return Err(AppError::NotFound(format!(
            "Listing {} is not in the current results",
            request.key
        )));
    }
    Ok(Json(session.view().await))
}

pub async fn clear_selection(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<SessionView>> {
    let session = find_session(&app_state, id).await?;
    session.clear_selection().await;
    Ok(Json(session.view().await))
}

#[derive(Deserialize)]
pub struct ModelRequest {
    #[serde(default)]
    model: String,
}

pub async fn choose_model(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    JsonExtract(request): JsonExtract<ModelRequest>,
) -> AppResult<Json<SessionView>> {
    let session = find_session(&app_state, id).await?;
    session.choose_model(&request.model).await?;
    Ok(Json(session.view().await))
}

pub async fn choose_make(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    JsonExtract(request): JsonExtract<MakeRequest>,
) -> AppResult<impl IntoResponse> {
    let session = find_session(&app_state, id).await?;
    session.choose_make(&request.make).await;
    Ok((StatusCode::ACCEPTED, Json(session.view().await)))
}
