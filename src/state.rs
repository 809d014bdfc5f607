//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AdmissionService, AuthService, LinkService, StatsService};
use crate::domain::repositories::UrlStore;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn UrlStore>>,
    pub admission: Arc<AdmissionService>,
    pub stats_service: Arc<StatsService>,
    pub auth_service: Arc<AuthService>,
    /// Public prefix of short URLs, e.g. `https://s.example.com`.
    pub base_url: Arc<str>,
    /// Read client IPs from forwarding headers instead of the socket peer.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn short_url(&self, code: &str) -> String {
        self.link_service.short_url(&self.base_url, code)
    }
}
