// 🗂️ Catalog - the one state container behind every view
//
// Owns listing state, filter inputs, the cursor, the selection and the detail
// view. User intents and async completions come in as method calls / Actions;
// side effects go out as Commands for the event loop to run.

use crate::detail::{DetailState, DetailView, FetchTicket};
use crate::entity::{CatalogSnapshot, Pokemon, PokemonId};
use crate::error::FetchError;
use crate::filter::{FilterState, PokemonType};
use crate::selection::Selection;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Completion of a background task
#[derive(Debug)]
pub enum Action {
    /// Generation of the load that produced it
    ListingLoaded(u64, Result<CatalogSnapshot, FetchError>),
    DetailLoaded(FetchTicket, Result<Pokemon, FetchError>),
}

/// Side effect requested by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    LoadListing(u64),
    FetchDetail(FetchTicket),
}

#[derive(Debug, Clone)]
pub enum ListingState {
    Loading,
    Ready(CatalogSnapshot),
    Failed(String),
}

pub struct Catalog {
    listing: ListingState,
    /// Bumped per listing load; older results are dropped
    listing_generation: u64,
    filter: FilterState,
    /// Positions into the snapshot that pass the filter, in listing order
    visible: Vec<usize>,
    cursor: Option<usize>,
    selection: Selection,
    detail: DetailView,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            listing: ListingState::Loading,
            listing_generation: 0,
            filter: FilterState::default(),
            visible: Vec::new(),
            cursor: None,
            selection: Selection::Closed,
            detail: DetailView::new(),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn listing(&self) -> &ListingState {
        &self.listing
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn detail(&self) -> &DetailState {
        self.detail.state()
    }

    pub fn entries(&self) -> &[Pokemon] {
        match &self.listing {
            ListingState::Ready(snapshot) => &snapshot.entries,
            _ => &[],
        }
    }

    pub fn visible(&self) -> Vec<&Pokemon> {
        let entries = self.entries();
        self.visible.iter().filter_map(|&i| entries.get(i)).collect()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn cursor_entity(&self) -> Option<&Pokemon> {
        self.cursor
            .and_then(|c| self.visible.get(c))
            .and_then(|&i| self.entries().get(i))
    }

    // ========================================================================
    // ASYNC COMPLETIONS
    // ========================================================================

    pub fn handle_action(&mut self, action: Action) -> Command {
        match action {
            Action::ListingLoaded(generation, _) if generation != self.listing_generation => {
                debug!(generation, current = self.listing_generation, "stale listing dropped");
            }
            Action::ListingLoaded(_, Ok(snapshot)) => {
                info!(entries = snapshot.len(), "listing ready");
                self.listing = ListingState::Ready(snapshot);
                self.recompute_view();
            }
            Action::ListingLoaded(_, Err(e)) => {
                warn!(error = %e, "listing failed");
                self.listing = ListingState::Failed(e.to_string());
                self.recompute_view();
            }
            Action::DetailLoaded(ticket, result) => {
                self.detail.resolve(ticket, result);
            }
        }
        Command::None
    }

    /// Start a listing load; only its result will be accepted
    pub fn load_listing(&mut self) -> Command {
        self.listing_generation += 1;
        self.listing = ListingState::Loading;
        self.recompute_view();
        Command::LoadListing(self.listing_generation)
    }

    /// Throw away the current snapshot and load a fresh one
    pub fn reload(&mut self) -> Command {
        self.load_listing()
    }

    // ========================================================================
    // FILTERS
    // ========================================================================

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
        self.recompute_view();
    }

    pub fn push_query(&mut self, c: char) {
        self.filter.query.push(c);
        self.recompute_view();
    }

    pub fn pop_query(&mut self) {
        if self.filter.query.pop().is_some() {
            self.recompute_view();
        }
    }

    pub fn toggle_category(&mut self, tag: PokemonType) {
        self.filter.toggle_category(tag);
        self.recompute_view();
    }

    pub fn reset_filters(&mut self) {
        self.filter.reset();
        self.recompute_view();
    }

    // ========================================================================
    // CURSOR
    // ========================================================================

    pub fn next(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        self.cursor = Some(match self.cursor {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    pub fn previous(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        self.cursor = Some(match self.cursor {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        });
    }

    pub fn page_down(&mut self, step: usize) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = self.cursor.map_or(0, |i| (i + step).min(len - 1));
        self.cursor = Some(i);
    }

    pub fn page_up(&mut self, step: usize) {
        if self.visible.is_empty() {
            return;
        }
        let i = self.cursor.map_or(0, |i| i.saturating_sub(step));
        self.cursor = Some(i);
    }

    pub fn first(&mut self) {
        if !self.visible.is_empty() {
            self.cursor = Some(0);
        }
    }

    pub fn last(&mut self) {
        if !self.visible.is_empty() {
            self.cursor = Some(self.visible.len() - 1);
        }
    }

    // ========================================================================
    // SELECTION / DETAIL
    // ========================================================================

    /// Open the detail overlay for `id`. The listing stays exactly as it is.
    pub fn select(&mut self, id: PokemonId) -> Command {
        self.selection.select(id.clone());
        Command::FetchDetail(self.detail.begin(id))
    }

    /// Select the entity under the cursor
    pub fn select_current(&mut self) -> Command {
        match self.cursor_entity().map(|p| p.id) {
            Some(id) => self.select(PokemonId::Number(id)),
            None => Command::None,
        }
    }

    pub fn close(&mut self) {
        self.selection.close();
        self.detail.clear();
    }

    /// Hand the spawned detail task to the view so it can be aborted later
    pub fn track_detail(&mut self, ticket: &FetchTicket, handle: AbortHandle) {
        self.detail.track(ticket, handle);
    }

    fn recompute_view(&mut self) {
        self.visible = self.filter.apply_indices(self.entries());
        self.cursor = if self.visible.is_empty() { None } else { Some(0) };
    }
}
