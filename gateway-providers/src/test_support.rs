//! In-memory routing store and mock provider servers for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use gateway_types::{Provider, ProviderConfigRepository, ProviderConfiguration, RepoError};

// ─────────────────────────────────────────────────────────────────────────────
// Routing store
// ─────────────────────────────────────────────────────────────────────────────

/// Rows keyed by (currency, country), ranked like the SQL adapters rank them.
#[derive(Default)]
pub struct MemoryConfigStore {
    pub rows: Vec<(String, String, ProviderConfiguration)>,
    pub fail: bool,
}

impl MemoryConfigStore {
    pub fn with(mut self, currency: &str, country: &str, config: ProviderConfiguration) -> Self {
        self.rows
            .push((currency.to_string(), country.to_string(), config));
        self
    }
}

pub fn config(id: i64, provider: &str, base_url: &str, priority: i32) -> ProviderConfiguration {
    ProviderConfiguration {
        id,
        country_id: 1,
        currency_id: 1,
        provider_id: if provider == "HSBC" { 1 } else { 2 },
        provider_name: provider.to_string(),
        base_url: base_url.to_string(),
        priority,
    }
}

#[async_trait::async_trait]
impl ProviderConfigRepository for MemoryConfigStore {
    async fn find_provider_config(
        &self,
        currency_code: &str,
        country_code: &str,
    ) -> Result<Option<ProviderConfiguration>, RepoError> {
        if self.fail {
            return Err(RepoError::Database("connection refused".into()));
        }
        Ok(self
            .rows
            .iter()
            .filter(|(cur, cty, _)| cur == currency_code && cty == country_code)
            .map(|(_, _, c)| c)
            .min_by_key(|c| (c.priority, c.id))
            .cloned())
    }

    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>, RepoError> {
        Ok(self
            .rows
            .iter()
            .find(|(_, _, c)| c.provider_name == name)
            .map(|(_, _, c)| Provider {
                id: c.provider_id,
                name: c.provider_name.clone(),
            }))
    }

    async fn list_provider_names(&self) -> Result<Vec<String>, RepoError> {
        let mut names: Vec<String> = self
            .rows
            .iter()
            .map(|(_, _, c)| c.provider_name.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock provider server
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Recorded {
    pub hits: Arc<AtomicUsize>,
    pub last: Arc<Mutex<Option<(HeaderMap, String)>>>,
}

impl Recorded {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> String {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, b)| b.clone())
            .unwrap_or_default()
    }

    pub fn last_header(&self, name: &str) -> Option<String> {
        self.last.lock().unwrap().as_ref().and_then(|(h, _)| {
            h.get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
    }
}

/// Serves `path` with a canned response and returns the base URL plus a recorder.
pub async fn spawn_provider(
    path: &'static str,
    status: StatusCode,
    response: &'static str,
) -> (String, Recorded) {
    let recorded = Recorded::default();
    let rec = recorded.clone();
    let app = Router::new().route(
        path,
        post(move |headers: HeaderMap, body: Bytes| {
            let rec = rec.clone();
            async move {
                rec.hits.fetch_add(1, Ordering::SeqCst);
                *rec.last.lock().unwrap() =
                    Some((headers, String::from_utf8_lossy(&body).into_owned()));
                (status, response)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), recorded)
}

pub fn client() -> reqwest::Client {
    crate::build_http_client(std::time::Duration::from_secs(5)).unwrap()
}
