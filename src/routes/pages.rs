// Server-rendered results page. Forms post to the same session operations as
// the JSON API and redirect back to the page.

use askama::Template;
use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    AppState,
    controller::Phase,
    error::{AppError, AppResult},
    filters::{DEFAULT_RADIUS, EARLIEST_YEAR, FilterForm, NumberField, latest_model_year},
    makes,
    presentation::{self, Card, Detail},
    session::{SearchSession, SessionView},
    sort::SortKey,
};

use super::api::find_session;

struct Choice {
    value: String,
    label: String,
    selected: bool,
}

// Values shown in the search form inputs
struct SearchFields {
    model: String,
    zip: String,
    radius: String,
    year_min: String,
    year_max: String,
}

impl SearchFields {
    // A rejected form comes back as typed; otherwise the last search, or the defaults
    fn new(view: &SessionView, rejected: Option<&FilterForm>, latest_year: i32) -> Self {
        let text = |field: &Option<NumberField>, default: String| {
            field.as_ref().map(|f| f.to_string()).unwrap_or(default)
        };
        match (rejected, view.filters.as_ref()) {
            (Some(form), _) => SearchFields {
                model: form.model.trim().to_string(),
                zip: form.zip.trim().to_string(),
                radius: text(&form.radius, DEFAULT_RADIUS.to_string()),
                year_min: text(&form.year_min, EARLIEST_YEAR.to_string()),
                year_max: text(&form.year_max, latest_year.to_string()),
            },
            (None, Some(filters)) => SearchFields {
                model: view.model.clone(),
                zip: filters.zip.clone(),
                radius: filters.radius.to_string(),
                year_min: filters.year_min.to_string(),
                year_max: filters.year_max.to_string(),
            },
            (None, None) => SearchFields {
                model: view.model.clone(),
                zip: String::new(),
                radius: DEFAULT_RADIUS.to_string(),
                year_min: EARLIEST_YEAR.to_string(),
                year_max: latest_year.to_string(),
            },
        }
    }
}

#[derive(Template)]
#[template(path = "session.html")]
struct SessionTemplate {
    session_id: u64,
    make: String,
    makes: Vec<Choice>,
    models: Vec<Choice>,
    models_loading: bool,
    has_make: bool,
    fields: SearchFields,
    earliest_year: i32,
    latest_year: i32,
    form_error: Option<String>,
    is_idle: bool,
    is_searching: bool,
    error_message: Option<String>,
    show_results: bool,
    result_count: usize,
    result_noun: &'static str,
    sort_options: Vec<Choice>,
    cards: Vec<Card>,
    detail: Option<Detail>,
}

impl SessionTemplate {
    fn new(
        session_id: u64,
        view: SessionView,
        form_error: Option<String>,
        rejected: Option<&FilterForm>,
    ) -> Self {
        let latest_year = latest_model_year();
        let fields = SearchFields::new(&view, rejected, latest_year);
        let makes = makes::all()
            .iter()
            .map(|m| Choice {
                value: m.clone(),
                label: m.clone(),
                selected: *m == view.make,
            })
            .collect();
        let models = view
            .models
            .iter()
            .map(|m| Choice {
                value: m.clone(),
                label: m.clone(),
                selected: *m == fields.model,
            })
            .collect();
        let sort_options = SortKey::ALL
            .into_iter()
            .map(|key| Choice {
                value: key.as_str().to_string(),
                label: key.label().to_string(),
                selected: key == view.sort_key,
            })
            .collect();

        SessionTemplate {
            session_id,
            makes,
            models,
            models_loading: view.models_loading,
            has_make: !view.make.is_empty(),
            make: view.make.clone(),
            fields,
            earliest_year: EARLIEST_YEAR,
            latest_year,
            form_error,
            is_idle: view.phase == Phase::Idle,
            is_searching: view.phase == Phase::Searching,
            error_message: view.error_message,
            show_results: view.phase == Phase::Success,
            result_count: view.result_count,
            result_noun: if view.result_count == 1 { "vehicle" } else { "vehicles" },
            sort_options,
            cards: view.listings.iter().map(presentation::card).collect(),
            detail: view.selected.as_ref().map(presentation::detail),
        }
    }
}

async fn render(
    session_id: u64,
    session: &SearchSession,
    form_error: Option<String>,
    rejected: Option<&FilterForm>,
) -> AppResult<Html<String>> {
    let template = SessionTemplate::new(session_id, session.view().await, form_error, rejected);
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render session template: {}", e);
            Err(AppError::InternalServerError(anyhow::Error::new(e)))
        }
    }
}

fn back_to(session_id: u64) -> Redirect {
    Redirect::to(&format!("/sessions/{}", session_id))
}

#[derive(Deserialize)]
pub struct MakeForm {
    #[serde(default)]
    make: String,
}

#[derive(Deserialize)]
pub struct SortForm {
    sort_key: String,
}

#[derive(Deserialize)]
pub struct SelectForm {
    key: String,
}

// GET / starts a fresh session
pub async fn new_session(State(app_state): State<AppState>) -> impl IntoResponse {
    let (id, _) = app_state.sessions.create().await;
    back_to(id)
}

pub async fn session_page(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Html<String>> {
    let session = find_session(&app_state, id).await?;
    render(id, &session, None, None).await
}

pub async fn submit_search(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<FilterForm>,
) -> AppResult<Response> {
    let session = find_session(&app_state, id).await?;

    let submitted = match form.submit() {
        Ok(filters) => session.submit_search(&filters).await.map(|_| ()),
        Err(e) => Err(e),
    };
    match submitted {
        Ok(()) => Ok(back_to(id).into_response()),
        Err(e) => {
            // Unsubmittable form: re-render with the problem, state untouched
            tracing::debug!(session = id, error = %e, "Rejected search form");
            let page = render(id, &session, Some(e.to_string()), Some(&form)).await?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
    }
}

pub async fn choose_make(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<MakeForm>,
) -> AppResult<Redirect> {
    let session = find_session(&app_state, id).await?;
    if let Some(fetch) = session.choose_make(&form.make).await {
        // Let the page show the model list on the redirect when it is quick
        if let Err(e) = fetch.await {
            tracing::warn!(session = id, error = %e, "Model lookup task failed");
        }
    }
    Ok(back_to(id))
}

pub async fn set_sort_key(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<SortForm>,
) -> AppResult<Redirect> {
    let session = find_session(&app_state, id).await?;
    let key = form
        .sort_key
        .parse::<SortKey>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    session.set_sort_key(key).await;
    Ok(back_to(id))
}

pub async fn select_listing(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<SelectForm>,
) -> AppResult<Redirect> {
    let session = find_session(&app_state, id).await?;
    if !session.select_listing(&form.key).await {
        tracing::debug!(session = id, key = %form.key, "Selected listing is no longer shown");
    }
    Ok(back_to(id))
}

pub async fn clear_selection(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Redirect> {
    let session = find_session(&app_state, id).await?;
    session.clear_selection().await;
    Ok(back_to(id))
}
