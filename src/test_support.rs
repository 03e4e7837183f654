// In-process PRTG stand-ins for transport, fetcher and service tests
use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::entity::{EntityKind, EntityRecord};
use crate::domain::error::{MonitoringError, MonitoringResult};
use crate::domain::historical::HistoricalPoint;
use crate::domain::query::TimeRange;
use crate::domain::status::ServerStatus;
use crate::infrastructure::config::PrtgSettings;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct CannedResponse {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<String, CannedResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
    pub accept: Option<String>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct MockPrtgServer {
    base_url: String,
    state: Arc<MockState>,
}

impl MockPrtgServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn respond(&self, endpoint: &str, status: u16, body: impl Into<String>) {
        self.insert(endpoint, status, body.into(), None);
    }

    pub fn respond_after(&self, endpoint: &str, delay: Duration, status: u16, body: impl Into<String>) {
        self.insert(endpoint, status, body.into(), Some(delay));
    }

    fn insert(&self, endpoint: &str, status: u16, body: String, delay: Option<Duration>) {
        let response = CannedResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay,
        };
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn settings(&self) -> PrtgSettings {
        PrtgSettings::new(self.base_url.clone(), "test-token")
    }
}

async fn handle(State(state): State<Arc<MockState>>, headers: HeaderMap, uri: Uri) -> impl IntoResponse {
    let endpoint = uri.path().trim_start_matches("/api/").to_string();
    let params = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                urlencoding::decode(key).unwrap().into_owned(),
                urlencoding::decode(value).unwrap().into_owned(),
            )
        })
        .collect();
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        endpoint: endpoint.clone(),
        params,
        accept,
    });

    let canned = state.routes.lock().unwrap().get(&endpoint).cloned();
    match canned {
        Some(canned) => {
            if let Some(delay) = canned.delay {
                tokio::time::sleep(delay).await;
            }
            (canned.status, [(header::CONTENT_TYPE, "application/json")], canned.body)
        }
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            String::new(),
        ),
    }
}

/// Counts repository calls made through a [`FakeRepository`].
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn total(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory repository for service tests.
#[derive(Clone, Default)]
pub struct FakeRepository {
    pub status: ServerStatus,
    points: Vec<HistoricalPoint>,
    entities: Vec<EntityRecord>,
    delay: Option<Duration>,
    calls: CallCounter,
}

impl FakeRepository {
    pub fn with_points(points: Vec<HistoricalPoint>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    pub fn with_entities(entities: Vec<EntityRecord>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }

    async fn enter(&self) {
        self.calls.bump();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MonitoringRepository for FakeRepository {
    async fn status(&self) -> MonitoringResult<ServerStatus> {
        self.enter().await;
        Ok(self.status.clone())
    }

    async fn entities(&self, kind: EntityKind) -> MonitoringResult<Vec<EntityRecord>> {
        self.enter().await;
        Ok(self
            .entities
            .iter()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect())
    }

    async fn historical_data(
        &self,
        object_id: &str,
        _range: TimeRange,
    ) -> MonitoringResult<Vec<HistoricalPoint>> {
        self.enter().await;
        if self.points.is_empty() {
            return Err(MonitoringError::empty(format!("object {}", object_id)));
        }
        Ok(self.points.clone())
    }
}
