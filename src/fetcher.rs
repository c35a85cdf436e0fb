// 🎣 Entity Fetcher - one remote read → one normalized Pokemon
// No retries: a failed read surfaces as FetchError to the caller.

use crate::api::Transport;
use crate::entity::{ListingEntry, Pokemon, PokemonId};
use crate::error::FetchError;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct EntityFetcher {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl EntityFetcher {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        EntityFetcher {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// `{base}/pokemon/{id}`, id percent-encoded
    pub fn detail_url(&self, id: &PokemonId) -> String {
        format!(
            "{}/pokemon/{}",
            self.base_url,
            urlencoding::encode(&id.to_string())
        )
    }

    /// Fetch and normalize the detail record of `id`.
    pub async fn fetch(&self, id: &PokemonId) -> Result<Pokemon, FetchError> {
        let url = self.detail_url(id);
        self.fetch_from(&id.to_string(), &url).await
    }

    /// Follow a listing entry's `url`; errors name the entry.
    pub async fn fetch_entry(&self, entry: &ListingEntry) -> Result<Pokemon, FetchError> {
        self.fetch_from(&entry.name, &entry.url).await
    }

    async fn fetch_from(&self, subject: &str, url: &str) -> Result<Pokemon, FetchError> {
        let body = self.transport.get(url).await.map_err(|e| {
            warn!(subject, error = %e, "detail fetch failed");
            FetchError::transport(subject, e)
        })?;

        let pokemon = Pokemon::from_json(&body).map_err(|e| {
            warn!(subject, error = %e, "detail record rejected");
            FetchError::parse(subject, e)
        })?;

        debug!(subject, id = pokemon.id, name = %pokemon.name, "fetched");
        Ok(pokemon)
    }
}
