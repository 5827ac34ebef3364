// Vehicle listing search front end: per-session search controllers behind an
// axum JSON API and a server-rendered results page.

use std::sync::Arc;

use axum::extract::FromRef;

pub mod config;
pub mod controller;
pub mod error;
pub mod filters;
pub mod listing_api;
pub mod makes;
pub mod models;
pub mod presentation;
pub mod routes;
pub mod session;
pub mod sort;

use crate::{config::Settings, listing_api::ModelLookup, session::SessionStore};

// Shared application state handed to every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub lookup: Arc<dyn ModelLookup>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wires sessions to a listing service client.
    pub fn new(settings: Settings, http_client: Arc<reqwest::Client>) -> Self {
        let service = Arc::new(listing_api::ListingService::new(http_client, &settings));
        let sessions = SessionStore::new(
            service.clone(),
            service.clone(),
            settings.page_size,
            settings.request_timeout(),
            settings.max_sessions,
        );
        AppState {
            settings: Arc::new(settings),
            lookup: service,
            sessions: Arc::new(sessions),
        }
    }
}
