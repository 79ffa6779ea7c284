//! Result resolution.
//!
//! Picks the one analysis record a render pass shows. Sources are tried in a
//! fixed order and the first one that yields data wins:
//!
//! 1. persisted record, when the navigation context carries `id` and `from=db`
//! 2. the envelope cached in the session scope
//! 3. the built-in demo record
//!
//! Failures in 1 and 2 degrade to the next source, so resolution never fails.
//! Nothing here writes to storage.

use crate::client::AnalysisBackend;
use crate::models::{demo_record, AnalysisRecord};
use crate::storage::{load_envelope, StorageScope};
use serde::Serialize;

/// Query parameters that select the persisted-record path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationContext {
    pub id: Option<String>,
    pub from: Option<String>,
}

impl NavigationContext {
    pub fn new(id: Option<String>, from: Option<String>) -> Self {
        Self { id, from }
    }

    /// Parse a query string such as `?id=65f0c2&from=db`. Unknown keys are
    /// ignored; the first occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let mut ctx = Self::default();
        let query = query.trim().trim_start_matches('?');

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.replace('+', " ");
            match key {
                "id" if ctx.id.is_none() => ctx.id = Some(value),
                "from" if ctx.from.is_none() => ctx.from = Some(value),
                _ => {}
            }
        }
        ctx
    }

    /// Identifier to fetch, when both `id` and `from=db` are present.
    pub fn persisted_id(&self) -> Option<&str> {
        match (&self.id, self.from.as_deref()) {
            (Some(id), Some("db")) if !id.is_empty() => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Where the active record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultSource {
    Persisted,
    Session,
    Demo,
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSource::Persisted => write!(f, "Database"),
            ResultSource::Session => write!(f, "Session"),
            ResultSource::Demo => write!(f, "Demo"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: AnalysisRecord,
    pub source: ResultSource,
}

pub struct ResultResolver<'a> {
    backend: &'a dyn AnalysisBackend,
    session: &'a dyn StorageScope,
}

impl<'a> ResultResolver<'a> {
    pub fn new(backend: &'a dyn AnalysisBackend, session: &'a dyn StorageScope) -> Self {
        Self { backend, session }
    }

    pub async fn resolve(&self, ctx: &NavigationContext) -> Resolution {
        if let Some(id) = ctx.persisted_id() {
            log::info!("Loading analysis from database: {}", id);
            match self.backend.fetch_analysis(id).await {
                Ok(persisted) => {
                    return Resolution {
                        record: persisted.into_record(),
                        source: ResultSource::Persisted,
                    };
                }
                Err(e) => log::warn!("Persisted analysis {} unavailable: {}", id, e),
            }
        }

        if let Some(envelope) = load_envelope(self.session) {
            log::info!("Loaded analysis from session: {}", envelope.filename);
            return Resolution {
                record: AnalysisRecord::from_envelope(&envelope),
                source: ResultSource::Session,
            };
        }

        log::info!("No stored analysis found, using demo data");
        Resolution {
            record: demo_record(),
            source: ResultSource::Demo,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::{ScopeError, ScopeResult};
    use crate::models::{PersistedAnalysis, SessionResultEnvelope};
    use crate::storage::{store_envelope, MemoryScope, ANALYSIS_RESULT_KEY};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double: serves one persisted record or fails every call.
    /// `persisted_error` picks the failure kind of the persisted lookup.
    #[derive(Default)]
    pub(crate) struct MockBackend {
        pub persisted: Option<PersistedAnalysis>,
        pub persisted_error: Option<fn(&str) -> ScopeError>,
        pub prediction: Option<Value>,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl AnalysisBackend for MockBackend {
        async fn fetch_analysis(&self, id: &str) -> ScopeResult<PersistedAnalysis> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = self.persisted_error {
                return Err(error(id));
            }
            self.persisted
                .clone()
                .ok_or_else(|| ScopeError::NotFound(id.to_string()))
        }

        async fn predict(&self, _filename: &str, _data: Vec<u8>) -> ScopeResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prediction.clone().ok_or_else(|| ScopeError::Status {
                status: 500,
                body: "model not loaded".to_string(),
            })
        }
    }

    fn persisted() -> PersistedAnalysis {
        PersistedAnalysis {
            filename: "gateway.bin".to_string(),
            filesize: 4096,
            architecture: Some("x86_64".to_string()),
            detected_algorithm: Some("SHA256".to_string()),
            category: Some("Hash Function".to_string()),
            confidence: 91.0,
        }
    }

    fn cached_session() -> MemoryScope {
        let scope = MemoryScope::new();
        let envelope = SessionResultEnvelope::new(
            "cached.bin",
            100,
            json!({ "detected": "HMAC", "category": "MAC Algorithm", "confidence": 77.0 }),
        );
        store_envelope(&scope, &envelope).unwrap();
        scope
    }

    fn db_context() -> NavigationContext {
        NavigationContext::from_query("?id=65f0c2aa&from=db")
    }

    #[test]
    fn test_query_parsing() {
        let ctx = NavigationContext::from_query("?id=123&loading=true&from=db");
        assert_eq!(ctx.id.as_deref(), Some("123"));
        assert_eq!(ctx.persisted_id(), Some("123"));

        let ctx = NavigationContext::from_query("id=123");
        assert_eq!(ctx.persisted_id(), None);

        let ctx = NavigationContext::from_query("from=db&id");
        assert_eq!(ctx.persisted_id(), None);
    }

    #[tokio::test]
    async fn test_persisted_wins_over_session() {
        let backend = MockBackend {
            persisted: Some(persisted()),
            ..Default::default()
        };
        let session = cached_session();
        let resolution = ResultResolver::new(&backend, &session)
            .resolve(&db_context())
            .await;

        assert_eq!(resolution.source, ResultSource::Persisted);
        assert_eq!(resolution.record.detected, "SHA256");
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_session() {
        let backend = MockBackend::default();
        let session = cached_session();
        let resolution = ResultResolver::new(&backend, &session)
            .resolve(&db_context())
            .await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolution.source, ResultSource::Session);
        assert_eq!(resolution.record.detected, "HMAC");
    }

    #[tokio::test]
    async fn test_network_error_falls_back_to_session() {
        let failures: [fn(&str) -> ScopeError; 3] = [
            |_| ScopeError::Status {
                status: 500,
                body: "internal error".to_string(),
            },
            |_| ScopeError::from(serde_json::from_str::<Value>("{truncated").unwrap_err()),
            |id| ScopeError::external(format!("GET /analysis/{}", id), "connection reset"),
        ];

        for failure in failures {
            let backend = MockBackend {
                persisted: Some(persisted()),
                persisted_error: Some(failure),
                ..Default::default()
            };
            let session = cached_session();
            let resolution = ResultResolver::new(&backend, &session)
                .resolve(&db_context())
                .await;

            assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
            assert_eq!(resolution.source, ResultSource::Session);
            assert_eq!(resolution.record.detected, "HMAC");
            assert_eq!(resolution.record.confidence, 77.0);
        }
    }

    #[tokio::test]
    async fn test_network_error_without_session_uses_demo() {
        let backend = MockBackend {
            persisted_error: Some(|_| ScopeError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
            ..Default::default()
        };
        let session = MemoryScope::new();
        let resolution = ResultResolver::new(&backend, &session)
            .resolve(&db_context())
            .await;

        assert_eq!(resolution.source, ResultSource::Demo);
        assert!(session.get(ANALYSIS_RESULT_KEY).is_none());
    }

    #[tokio::test]
    async fn test_session_skips_backend_without_db_flag() {
        let backend = MockBackend {
            persisted: Some(persisted()),
            ..Default::default()
        };
        let session = cached_session();
        let resolution = ResultResolver::new(&backend, &session)
            .resolve(&NavigationContext::from_query("?id=65f0c2aa"))
            .await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(resolution.source, ResultSource::Session);
    }

    #[tokio::test]
    async fn test_everything_missing_uses_demo() {
        let backend = MockBackend::default();
        let session = MemoryScope::new();
        session
            .set(ANALYSIS_RESULT_KEY, "{broken".to_string())
            .unwrap();

        let resolution = ResultResolver::new(&backend, &session)
            .resolve(&db_context())
            .await;

        assert_eq!(resolution.source, ResultSource::Demo);
        assert_eq!(resolution.record.filename, "firmware_sample.bin");
    }

    #[tokio::test]
    async fn test_resolution_does_not_write_storage() {
        let backend = MockBackend {
            persisted: Some(persisted()),
            ..Default::default()
        };
        let session = MemoryScope::new();
        ResultResolver::new(&backend, &session)
            .resolve(&db_context())
            .await;

        assert!(session.get(ANALYSIS_RESULT_KEY).is_none());
    }
}
