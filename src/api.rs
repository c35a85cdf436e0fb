// 🌐 Remote API seam - every read of PokéAPI goes through a Transport
//
// HttpTransport talks to the real API with reqwest.
// MemoryTransport serves canned bodies (with optional latency) for tests.

use crate::config::Config;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// A read-only GET returning the response body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| TransportError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

#[derive(Debug, Clone)]
struct Route {
    response: Result<String, u16>,
    delay: Duration,
}

/// Canned responses keyed by exact URL. Unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct MemoryTransport {
    routes: HashMap<String, Route>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(
            url.into(),
            Route {
                response: Ok(body.into()),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Same as `with_body`, but the response only arrives after `delay`
    pub fn with_delayed_body(
        mut self,
        url: impl Into<String>,
        body: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.routes.insert(
            url.into(),
            Route {
                response: Ok(body.into()),
                delay,
            },
        );
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.routes.insert(
            url.into(),
            Route {
                response: Err(status),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// URLs requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }

        let route = match self.routes.get(url) {
            Some(route) => route.clone(),
            None => {
                return Err(TransportError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            }
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        route.response.map_err(|status| TransportError::Status {
            url: url.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport_serves_routes() {
        let transport = MemoryTransport::new()
            .with_body("http://api/a", "{}")
            .with_status("http://api/b", 500);

        assert_eq!(transport.get("http://api/a").await.unwrap(), "{}");
        assert_eq!(
            transport.get("http://api/b").await.unwrap_err(),
            TransportError::Status { url: "http://api/b".to_string(), status: 500 }
        );
        assert!(matches!(
            transport.get("http://api/missing").await,
            Err(TransportError::Status { status: 404, .. })
        ));
        assert_eq!(
            transport.requests(),
            vec!["http://api/a", "http://api/b", "http://api/missing"]
        );
    }

    #[test]
    fn test_http_transport_builds_from_config() {
        let mut config = Config::default();
        config.request_timeout_secs = Some(5);

        assert!(HttpTransport::new(&config).is_ok());
    }
}
