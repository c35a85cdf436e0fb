// Pokedex - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod api;
pub mod catalog;
pub mod config;
pub mod detail;
pub mod entity;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod listing;
pub mod selection;

// Re-export commonly used types
pub use api::{HttpTransport, MemoryTransport, Transport};
pub use catalog::{Action, Catalog, Command, ListingState};
pub use config::{Config, MAX_LISTING};
pub use detail::{spawn_detail_fetch, DetailState, DetailView, FetchTicket};
pub use entity::{CatalogSnapshot, ListingEntry, Pokemon, PokemonId, RawListing, RawPokemon};
pub use error::{FetchError, ParseError, TransportError, UnknownType};
pub use fetcher::EntityFetcher;
pub use filter::{filter, FilterState, PokemonType};
pub use listing::{spawn_listing_load, ListingAggregator};
pub use selection::Selection;

use std::sync::Arc;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetcher + aggregator wired to the real API per `config`
pub fn connect(config: &Config) -> reqwest::Result<(EntityFetcher, ListingAggregator)> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
    let fetcher = EntityFetcher::new(transport, config.api_base_url.clone());
    let aggregator = ListingAggregator::new(fetcher.clone(), config.listing_limit);
    Ok((fetcher, aggregator))
}
