#![allow(dead_code)]

use axum::Router;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use shortlink::application::services::auth_service::parse_api_keys;
use shortlink::prelude::*;
use shortlink::routes::router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const FREE_KEY: &str = "free-key";
pub const PREMIUM_KEY: &str = "premium-key";
pub const OTHER_PREMIUM_KEY: &str = "other-premium";

pub const BASE_URL: &str = "https://s.example.com";

/// Fixed starting point for every test clock.
pub fn epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(epoch()))
}

pub fn create_link_service(
    store: Arc<MemoryUrlStore>,
    clock: Arc<ManualClock>,
) -> LinkService<MemoryUrlStore> {
    LinkService::new(store, AllocationSettings::default(), clock)
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryUrlStore>,
    pub clicks: Arc<MemoryClickStore>,
    pub clock: Arc<ManualClock>,
}

/// State over memory stores with no limiter sweeps.
///
/// The click worker is running, so this must be called within a tokio runtime.
pub fn create_test_state(
    redirect_limit: RedirectLimit,
    allocation_quota: AllocationQuota,
) -> TestContext {
    let clock = test_clock();
    let store = Arc::new(MemoryUrlStore::new());

    let dyn_store: Arc<dyn UrlStore> = store.clone();
    let link_service = LinkService::new(dyn_store, AllocationSettings::default(), clock.clone());
    let admission = AdmissionService::new(redirect_limit, allocation_quota, clock.clone());
    let clicks = Arc::new(MemoryClickStore::new());
    let stats_service = StatsService::start(clicks.clone(), 64);

    let keys = parse_api_keys(&format!(
        "{FREE_KEY}=1:free;{PREMIUM_KEY}=2:premium;{OTHER_PREMIUM_KEY}=3:premium"
    ))
    .unwrap();
    let auth_service = AuthService::new(keys, "test-signing-secret".to_string());

    let state = AppState {
        link_service: Arc::new(link_service),
        admission: Arc::new(admission),
        stats_service: Arc::new(stats_service),
        auth_service: Arc::new(auth_service),
        base_url: Arc::from(BASE_URL),
        behind_proxy: true,
    };

    TestContext {
        state,
        store,
        clicks,
        clock,
    }
}

/// Default limits, allocation quota disabled.
pub fn create_unlimited_state() -> TestContext {
    create_test_state(
        RedirectLimit {
            enabled: false,
            ..RedirectLimit::default()
        },
        AllocationQuota {
            enabled: false,
            ..AllocationQuota::default()
        },
    )
}

/// Polls until the click worker has written `expected` clicks for `url_id`.
pub async fn wait_for_clicks(clicks: &MemoryClickStore, url_id: i64, expected: i64) {
    for _ in 0..100 {
        if clicks.count_for_url(url_id).await.unwrap() >= expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("click worker did not record {expected} clicks for url {url_id}");
}

pub fn test_server(state: AppState) -> TestServer {
    let app: Router = router(state).layer(MockConnectInfoLayer);
    TestServer::new(app).unwrap()
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
