// Pokedex - Web Server
// JSON API over the catalog: filtered listing + route-based detail view

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use pokedex::{
    connect, CatalogSnapshot, Config, EntityFetcher, FetchError, FilterState, Pokemon,
    PokemonId, PokemonType, TransportError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    fetcher: EntityFetcher,
    /// Listing loaded at startup; detail requests never read it
    snapshot: Arc<CatalogSnapshot>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    q: String,
    #[serde(rename = "type")]
    category: Option<String>,
}

/// Listing response
#[derive(Serialize)]
struct ListingResponse<'a> {
    total: usize,
    count: usize,
    fetched_at: String,
    results: Vec<&'a Pokemon>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/types - The category vocabulary
async fn get_types() -> impl IntoResponse {
    let types: Vec<&str> = PokemonType::ALL.iter().map(|t| t.as_str()).collect();
    Json(ApiResponse::ok(types))
}

/// GET /api/pokemon?q=&type= - Filtered listing
async fn list_pokemon(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let category = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => match raw.parse::<PokemonType>() {
            Ok(tag) => Some(tag),
            Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
        },
        None => None,
    };

    let filter = FilterState::new(query.q, category);
    let results = filter.apply(&state.snapshot.entries);

    let response = ListingResponse {
        total: state.snapshot.len(),
        count: results.len(),
        fetched_at: state.snapshot.fetched_at.to_rfc3339(),
        results,
    };
    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/pokemon/:id - Fresh detail fetch, independent of the listing
async fn get_pokemon(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let id: PokemonId = match raw_id.parse() {
        Ok(id) => id,
        Err(e) => return failure(StatusCode::BAD_REQUEST, format!("{}", e)),
    };

    match state.fetcher.fetch(&id).await {
        Ok(pokemon) => (StatusCode::OK, Json(ApiResponse::ok(pokemon))).into_response(),
        Err(e) => {
            error!("Error fetching {}: {}", id, e);
            failure(status_for(&e), e.to_string())
        }
    }
}

fn status_for(err: &FetchError) -> StatusCode {
    match err {
        FetchError::InvalidId(_) => StatusCode::BAD_REQUEST,
        FetchError::Transport {
            source: TransportError::Status { status: 404, .. },
            ..
        } => StatusCode::NOT_FOUND,
        FetchError::Transport { .. } | FetchError::Parse { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/types", get(get_types))
        .route("/pokemon", get(list_pokemon))
        .route("/pokemon/:id", get(get_pokemon))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 Pokédex - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::load(None)?;
    let (fetcher, aggregator) = connect(&config).context("Failed to build HTTP client")?;

    println!("📚 Loading {} Pokémon from {}...", aggregator.limit(), config.api_base_url);
    let snapshot = aggregator
        .fetch_all()
        .await
        .context("Failed to load the catalog")?;
    println!("✓ Loaded {} Pokémon", snapshot.len());

    let state = AppState {
        fetcher,
        snapshot: Arc::new(snapshot),
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    info!(addr = %config.server_addr, "listening");
    println!("\n🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/pokemon", config.server_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pokedex::MemoryTransport;
    use serde_json::Value;
    use tower::ServiceExt;

    fn mon(id: u32, name: &str, types: &[&str]) -> Pokemon {
        Pokemon {
            id,
            name: name.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            image: None,
            height: 1.0,
            weight: 1.0,
            abilities: vec![],
        }
    }

    fn state() -> AppState {
        let transport = MemoryTransport::new()
            .with_body(
                "http://api/pokemon/25",
                r#"{ "id": 25, "name": "pikachu", "height": 4, "weight": 60,
                     "types": [{ "type": { "name": "electric" } }],
                     "sprites": { "front_default": "http://img/25.png" },
                     "abilities": [{ "ability": { "name": "static" } }] }"#,
            )
            .with_status("http://api/pokemon/26", 500)
            .with_body("http://api/pokemon/27", "{}");

        AppState {
            fetcher: EntityFetcher::new(Arc::new(transport), "http://api"),
            snapshot: Arc::new(CatalogSnapshot::new(vec![
                mon(1, "bulbasaur", &["grass", "poison"]),
                mon(4, "charmander", &["fire"]),
                mon(6, "charizard", &["fire", "flying"]),
            ])),
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_types_vocabulary() {
        let (_, body) = get_json("/api/types").await;

        assert_eq!(body["data"].as_array().unwrap().len(), 18);
        assert_eq!(body["data"][0], "normal");
    }

    #[tokio::test]
    async fn test_listing_unfiltered_keeps_order() {
        let (status, body) = get_json("/api/pokemon").await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["bulbasaur", "charmander", "charizard"]);
        assert_eq!(body["data"]["total"], 3);
    }

    #[tokio::test]
    async fn test_listing_filters() {
        let (_, body) = get_json("/api/pokemon?q=CHAR&type=flying").await;

        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["results"][0]["id"], 6);
    }

    #[tokio::test]
    async fn test_listing_rejects_unknown_type() {
        let (status, body) = get_json("/api/pokemon?type=stellar").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_detail_route_fetches_fresh() {
        let (status, body) = get_json("/api/pokemon/25").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "pikachu");
        assert_eq!(body["data"]["height"], 0.4);
        assert_eq!(body["data"]["weight"], 6.0);
        assert_eq!(body["data"]["abilities"][0], "static");
    }

    #[tokio::test]
    async fn test_detail_route_errors() {
        assert_eq!(get_json("/api/pokemon/26").await.0, StatusCode::BAD_GATEWAY);
        assert_eq!(get_json("/api/pokemon/27").await.0, StatusCode::BAD_GATEWAY);
        assert_eq!(get_json("/api/pokemon/999").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get_json("/api/pokemon/0").await.0, StatusCode::BAD_REQUEST);
    }
}
