// 📚 Listing Aggregator - listing endpoint + one concurrent detail fetch per row
//
// Output keeps listing order no matter which detail read finishes first.
// Fail-fast: the first failed detail read fails the whole listing.

use crate::catalog::Action;
use crate::config::MAX_LISTING;
use crate::entity::{CatalogSnapshot, RawListing};
use crate::error::FetchError;
use crate::fetcher::EntityFetcher;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct ListingAggregator {
    fetcher: EntityFetcher,
    limit: usize,
}

impl ListingAggregator {
    pub fn new(fetcher: EntityFetcher, limit: usize) -> Self {
        ListingAggregator {
            fetcher,
            limit: limit.clamp(1, MAX_LISTING),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn listing_url(&self) -> String {
        format!("{}/pokemon?limit={}", self.fetcher.base_url(), self.limit)
    }

    /// `GET /pokemon?limit=N`, truncated to the limit
    pub async fn fetch_listing(&self) -> Result<RawListing, FetchError> {
        let url = self.listing_url();
        let body = self
            .fetcher
            .transport()
            .get(&url)
            .await
            .map_err(|e| FetchError::transport("listing", e))?;

        let mut listing =
            RawListing::from_json(&body).map_err(|e| FetchError::parse("listing", e))?;
        listing.results.truncate(self.limit);
        Ok(listing)
    }

    /// Resolve the listing, then fetch every entry concurrently.
    pub async fn fetch_all(&self) -> Result<CatalogSnapshot, FetchError> {
        let listing = self.fetch_listing().await?;
        info!(entries = listing.results.len(), "listing resolved, fetching details");

        // try_join_all yields in input order and bails on the first error
        let entries = try_join_all(
            listing
                .results
                .iter()
                .map(|entry| self.fetcher.fetch_entry(entry)),
        )
        .await?;

        info!(entries = entries.len(), "catalog loaded");
        Ok(CatalogSnapshot::new(entries))
    }
}

/// Load the whole catalog in the background and report `Action::ListingLoaded`
pub fn spawn_listing_load(
    aggregator: Arc<ListingAggregator>,
    generation: u64,
    tx: UnboundedSender<Action>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = aggregator.fetch_all().await;
        if tx.send(Action::ListingLoaded(generation, result)).is_err() {
            debug!("listing result dropped, receiver closed");
        }
    })
}
