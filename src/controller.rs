//! Search controller: the per-session state machine behind the results page.
//!
//! ```text
//! idle | success | error --submit--> searching --results--> success
//!                                              \--failure--> error
//! ```
//!
//! Every submission is tagged with a generation number. A response may only
//! commit while the controller is still waiting on that same generation, so
//! a slow response to a superseded search can never overwrite a newer one.
//! The controller is synchronous; `session::SearchSession` drives it from
//! async tasks.

use serde::Serialize;

use crate::{
    error::{FilterError, SearchError},
    filters::{FilterSet, SearchQuery, YearRange},
    models::Listing,
    sort::{SortKey, sort_listings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Searching,
    Success,
    Error,
}

/// Results of a completed search. `filtered` holds indices into `raw`, in
/// ascending order, so it is an order-preserving subset by construction.
#[derive(Debug, Clone)]
pub struct ResultSet {
    raw: Vec<Listing>,
    years: YearRange,
    filtered: Vec<usize>,
}

impl ResultSet {
    pub fn new(raw: Vec<Listing>, years: YearRange) -> Self {
        let filtered = raw
            .iter()
            .enumerate()
            .filter(|(_, listing)| years.contains(listing.year()))
            .map(|(index, _)| index)
            .collect();
        ResultSet { raw, years, filtered }
    }

    pub fn raw(&self) -> &[Listing] {
        &self.raw
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn filtered(&self) -> impl Iterator<Item = &Listing> + '_ {
        self.filtered.iter().map(|&index| &self.raw[index])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }
}

#[derive(Debug, Clone)]
enum SearchState {
    Idle,
    Searching { generation: u64, years: YearRange },
    Success(ResultSet),
    Error { message: String },
}

// What the caller needs to run one submitted search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: SearchQuery,
}

#[derive(Debug, Clone)]
pub struct SearchController {
    state: SearchState,
    generation: u64,
    sort_key: SortKey,
    selected: Option<String>,
    last_filters: Option<FilterSet>,
    page_size: u32,
}

impl SearchController {
    pub fn new(page_size: u32) -> Self {
        SearchController {
            state: SearchState::Idle,
            generation: 0,
            sort_key: SortKey::default(),
            selected: None,
            last_filters: None,
            page_size,
        }
    }

    /// Moves to `searching` for a valid filter set and returns the query to
    /// run. Invalid filter sets are rejected without touching any state.
    pub fn begin_search(&mut self, filters: &FilterSet) -> Result<SearchTicket, FilterError> {
        filters.validate()?;

        self.generation += 1;
        self.selected = None;
        // Previous results are dropped now so they are never shown as current
        self.state = SearchState::Searching {
            generation: self.generation,
            years: filters.years(),
        };

        self.last_filters = Some(filters.clone());

        let query = filters.to_query(self.page_size);
        tracing::debug!(generation = self.generation, ?query, "Search submitted");
        Ok(SearchTicket {
            generation: self.generation,
            query,
        })
    }

    /// Commits the outcome of search `generation`. Returns false, leaving the
    /// state alone, when that search has been superseded.
    pub fn finish_search(
        &mut self,
        generation: u64,
        outcome: Result<Vec<Listing>, SearchError>,
    ) -> bool {
        let years = match &self.state {
            SearchState::Searching { generation: current, years } if *current == generation => *years,
            _ => {
                tracing::debug!(
                    generation,
                    current = self.generation,
                    "Discarding response for superseded search"
                );
                return false;
            }
        };

        self.state = match outcome {
            Ok(listings) => {
                let results = ResultSet::new(listings, years);
                tracing::info!(
                    generation,
                    received = results.raw().len(),
                    in_year_range = results.filtered_len(),
                    "Search completed"
                );
                SearchState::Success(results)
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "Search failed");
                SearchState::Error {
                    message: e.to_string(),
                }
            }
        };
        true
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            SearchState::Idle => Phase::Idle,
            SearchState::Searching { .. } => Phase::Searching,
            SearchState::Success(_) => Phase::Success,
            SearchState::Error { .. } => Phase::Error,
        }
    }

    // Filters of the most recent accepted submission
    pub fn last_filters(&self) -> Option<&FilterSet> {
        self.last_filters.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SearchState::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn results(&self) -> Option<&ResultSet> {
        match &self.state {
            SearchState::Success(results) => Some(results),
            _ => None,
        }
    }

    pub fn raw_results(&self) -> &[Listing] {
        self.results().map(ResultSet::raw).unwrap_or(&[])
    }

    pub fn filtered_results(&self) -> Vec<&Listing> {
        self.results()
            .map(|results| results.filtered().collect())
            .unwrap_or_default()
    }

    // Filtered results in the current sort order
    pub fn sorted_results(&self) -> Vec<&Listing> {
        match self.results() {
            Some(results) => sort_listings(results.filtered(), self.sort_key),
            None => Vec::new(),
        }
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.sort_key = key;
    }

    /// Selects the listing with `key` if it is among the filtered results.
    pub fn select_listing(&mut self, key: &str) -> Option<&Listing> {
        let found = self
            .results()
            .and_then(|results| results.filtered().find(|l| l.key() == key))
            .is_some();
        if !found {
            tracing::debug!(key, "Ignoring selection of a listing not in the results");
            return None;
        }
        self.selected = Some(key.to_string());
        self.selected_listing()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_listing(&self) -> Option<&Listing> {
        let key = self.selected.as_deref()?;
        self.results()?.filtered().find(|l| l.key() == key)
    }
}
