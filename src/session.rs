// Async driver around the search controller, plus the registry of live
// sessions. One session per browser tab / API client.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use tokio::{
    sync::{Mutex, RwLock},
    task::{AbortHandle, JoinHandle},
};

use crate::{
    controller::{Phase, SearchController},
    error::FilterError,
    filters::{FilterSet, ModelChoices},
    listing_api::{ListingSource, ModelLookup, search_with_timeout},
    models::Listing,
    sort::SortKey,
};

// Read-only snapshot handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub listings: Vec<Listing>, // Filtered, in sort order
    pub result_count: usize,
    pub selected: Option<Listing>,
    pub error_message: Option<String>,
    pub sort_key: SortKey,
    pub filters: Option<FilterSet>, // Last accepted submission
    pub make: String,
    pub model: String,
    pub models: Vec<String>,
    pub models_loading: bool,
}

struct SessionState {
    controller: SearchController,
    choices: ModelChoices,
    in_flight: Option<(u64, AbortHandle)>,
}

pub struct SearchSession {
    state: Arc<Mutex<SessionState>>,
    source: Arc<dyn ListingSource>,
    lookup: Arc<dyn ModelLookup>,
    timeout: Duration,
}

impl SearchSession {
    pub fn new(
        source: Arc<dyn ListingSource>,
        lookup: Arc<dyn ModelLookup>,
        page_size: u32,
        timeout: Duration,
    ) -> Self {
        SearchSession {
            state: Arc::new(Mutex::new(SessionState {
                controller: SearchController::new(page_size),
                choices: ModelChoices::default(),
                in_flight: None,
            })),
            source,
            lookup,
            timeout,
        }
    }

    /// Submits a search. The session is in `searching` by the time this
    /// returns; the returned handle resolves once the outcome is committed
    /// (or discarded as superseded). Any search still in flight is aborted.
    pub async fn submit_search(&self, filters: &FilterSet) -> Result<JoinHandle<()>, FilterError> {
        let mut state = self.state.lock().await;
        let ticket = state.controller.begin_search(filters)?;

        // Searching the chosen make also settles the chosen model
        let make = filters.make.trim();
        if !make.is_empty() && state.choices.make() == make {
            if let Err(e) = state.choices.select_model(&filters.model) {
                tracing::debug!(error = %e, "Model choice not recorded");
            }
        }

        if let Some((generation, previous)) = state.in_flight.take() {
            tracing::debug!(generation, "Cancelling superseded search");
            previous.abort();
        }

        let shared = Arc::clone(&self.state);
        let source = Arc::clone(&self.source);
        let timeout = self.timeout;
        let generation = ticket.generation;

        // The task cannot commit before we release the lock below
        let handle = tokio::spawn(async move {
            let outcome = search_with_timeout(source.as_ref(), &ticket.query, timeout).await;
            let mut state = shared.lock().await;
            state.controller.finish_search(ticket.generation, outcome);
            if matches!(state.in_flight, Some((current, _)) if current == ticket.generation) {
                state.in_flight = None;
            }
        });
        state.in_flight = Some((generation, handle.abort_handle()));
        Ok(handle)
    }

    pub async fn set_sort_key(&self, key: SortKey) {
        self.state.lock().await.controller.set_sort_key(key);
    }

    // Returns false if no listing with that key is in the current results
    pub async fn select_listing(&self, key: &str) -> bool {
        self.state.lock().await.controller.select_listing(key).is_some()
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.controller.clear_selection();
    }

    /// Chooses a make for the filter form and fetches its models. The
    /// returned handle is `None` when the make was cleared.
    pub async fn choose_make(&self, make: &str) -> Option<JoinHandle<()>> {
        let request = self.state.lock().await.choices.select_make(make)?;

        let shared = Arc::clone(&self.state);
        let lookup = Arc::clone(&self.lookup);
        Some(tokio::spawn(async move {
            let outcome = lookup.models_for_make(&request.make).await;
            let mut state = shared.lock().await;
            let applied = match outcome {
                Ok(models) => state.choices.accept_models(request.generation, models),
                Err(e) => {
                    tracing::warn!(make = %request.make, error = %e, "Model lookup failed");
                    state.choices.reject_models(request.generation)
                }
            };
            if !applied {
                tracing::debug!(make = %request.make, "Dropped model list for a superseded make");
            }
        }))
    }

    pub async fn choose_model(&self, model: &str) -> Result<(), FilterError> {
        self.state.lock().await.choices.select_model(model)
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.controller.phase()
    }

    pub async fn view(&self) -> SessionView {
        let state = self.state.lock().await;
        let controller = &state.controller;
        let listings: Vec<Listing> = controller.sorted_results().into_iter().cloned().collect();

        SessionView {
            phase: controller.phase(),
            result_count: listings.len(),
            listings,
            selected: controller.selected_listing().cloned(),
            error_message: controller.error_message().map(str::to_string),
            sort_key: controller.sort_key(),
            filters: controller.last_filters().cloned(),
            make: state.choices.make().to_string(),
            model: state.choices.model().to_string(),
            models: state.choices.models().to_vec(),
            models_loading: state.choices.is_loading(),
        }
    }
}

// Bounded registry of sessions. Ids are handed out in increasing order, so
// the smallest id is always the oldest session.
pub struct SessionStore {
    sessions: RwLock<BTreeMap<u64, Arc<SearchSession>>>,
    next_id: AtomicU64,
    capacity: usize,
    source: Arc<dyn ListingSource>,
    lookup: Arc<dyn ModelLookup>,
    page_size: u32,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(
        source: Arc<dyn ListingSource>,
        lookup: Arc<dyn ModelLookup>,
        page_size: u32,
        timeout: Duration,
        capacity: usize,
    ) -> Self {
        SessionStore {
            sessions: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
            source,
            lookup,
            page_size,
            timeout,
        }
    }

    pub async fn create(&self) -> (u64, Arc<SearchSession>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(SearchSession::new(
            Arc::clone(&self.source),
            Arc::clone(&self.lookup),
            self.page_size,
            self.timeout,
        ));

        let mut sessions = self.sessions.write().await;
        while sessions.len() >= self.capacity {
            if let Some((evicted, _)) = sessions.pop_first() {
                tracing::info!(session = evicted, "Evicted oldest session");
            }
        }
        sessions.insert(id, Arc::clone(&session));
        tracing::info!(session = id, live = sessions.len(), "Created search session");
        (id, session)
    }

    pub async fn get(&self, id: u64) -> Option<Arc<SearchSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
