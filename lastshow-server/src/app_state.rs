use std::{sync::Arc, time::Duration};

use shared::config::server::Config;

use crate::{
    auth::session::SessionCodec,
    services::{api_client::ObituaryApi, view_cache::ViewCache},
};

// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<dyn ObituaryApi>,
    pub views: Arc<ViewCache>,
    pub codec: SessionCodec,
}

impl AppState {
    /// Wires the state around an API implementation; cached views live as long as a session.
    pub fn new(config: Config, api: Arc<dyn ObituaryApi>) -> Self {
        let codec = SessionCodec::from_config(&config);
        let views = ViewCache::new(Duration::from_secs(config.session.max_age_seconds));
        Self {
            config: Arc::new(config),
            api,
            views: Arc::new(views),
            codec,
        }
    }
}
