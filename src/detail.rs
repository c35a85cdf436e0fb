// 🪟 Detail View Controller - loading / loaded / errored view of one identifier
//
// Each begin() issues a new ticket and aborts the previous in-flight task.
// A result is applied only if its ticket is still the current one, so a slow
// response for an earlier selection can never replace a newer one.

use crate::catalog::Action;
use crate::entity::{Pokemon, PokemonId};
use crate::error::FetchError;
use crate::fetcher::EntityFetcher;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

/// Identifies one detail request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: PokemonId,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    #[default]
    Idle,
    Loading(PokemonId),
    Loaded(Pokemon),
    Errored { id: PokemonId, message: String },
}

#[derive(Debug, Default)]
pub struct DetailView {
    state: DetailState,
    generation: u64,
    current: Option<FetchTicket>,
    task: Option<AbortHandle>,
}

impl DetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, DetailState::Loading(_))
    }

    /// Ticket of the request still awaited, if any
    pub fn pending(&self) -> Option<&FetchTicket> {
        self.current.as_ref()
    }

    /// Start (re)loading `id`. Always refetches, even for the same id.
    pub fn begin(&mut self, id: PokemonId) -> FetchTicket {
        self.abort_in_flight();
        self.generation += 1;

        let ticket = FetchTicket {
            id: id.clone(),
            generation: self.generation,
        };
        self.current = Some(ticket.clone());
        self.state = DetailState::Loading(id);
        ticket
    }

    /// Remember the task serving `ticket` so a later begin()/clear() can abort it
    pub fn track(&mut self, ticket: &FetchTicket, handle: AbortHandle) {
        if self.current.as_ref() == Some(ticket) {
            self.task = Some(handle);
        } else {
            handle.abort();
        }
    }

    /// Apply a finished request. Returns false when the result was stale.
    pub fn resolve(&mut self, ticket: FetchTicket, result: Result<Pokemon, FetchError>) -> bool {
        if self.current.as_ref() != Some(&ticket) {
            debug!(id = %ticket.id, "discarding stale detail result");
            return false;
        }

        self.current = None;
        self.task = None;
        self.state = match result {
            Ok(pokemon) => DetailState::Loaded(pokemon),
            Err(e) => DetailState::Errored {
                id: ticket.id,
                message: e.to_string(),
            },
        };
        true
    }

    pub fn clear(&mut self) {
        self.abort_in_flight();
        self.current = None;
        self.state = DetailState::Idle;
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}

/// Run the fetch for `ticket` and report back as `Action::DetailLoaded`
pub fn spawn_detail_fetch(
    fetcher: EntityFetcher,
    ticket: FetchTicket,
    tx: UnboundedSender<Action>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = fetcher.fetch(&ticket.id).await;
        if tx.send(Action::DetailLoaded(ticket, result)).is_err() {
            debug!("detail result dropped, receiver closed");
        }
    })
}
