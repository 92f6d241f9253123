use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::debug;

use shared::models::DashboardView;

use crate::auth::session::SessionToken;

/// Signal that a rendered view is stale.
pub trait Revalidate: Send + Sync {
    fn revalidate(&self, view: &str);
}

struct Entry {
    view: DashboardView,
    stored_at: Instant,
}

/// Per-session cache of dashboard data, keyed by view path.
pub struct ViewCache {
    ttl: Duration,
    views: Mutex<HashMap<String, HashMap<String, Entry>>>,
    invalidations: AtomicU64,
}

impl ViewCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            views: Mutex::new(HashMap::new()),
            invalidations: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HashMap<String, Entry>>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, view: &str, token: &SessionToken) -> Option<DashboardView> {
        let mut views = self.lock();
        let sessions = views.get_mut(view)?;
        let entry = sessions.get(token.expose())?;

        if entry.stored_at.elapsed() >= self.ttl {
            sessions.remove(token.expose());
            return None;
        }

        Some(entry.view.clone())
    }

    /// Stores a view after dropping every expired entry of any session.
    pub fn put(&self, view: &str, token: &SessionToken, data: DashboardView) {
        let mut views = self.lock();
        for sessions in views.values_mut() {
            sessions.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        }
        views.retain(|_, sessions| !sessions.is_empty());

        views.entry(view.to_string()).or_default().insert(
            token.expose().to_string(),
            Entry {
                view: data,
                stored_at: Instant::now(),
            },
        );
        debug!(view, entries = entry_count(&views), "view cached");
    }

    /// Entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        entry_count(&self.lock())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of invalidation signals received since startup.
    #[must_use]
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }
}

fn entry_count(views: &HashMap<String, HashMap<String, Entry>>) -> usize {
    views.values().map(HashMap::len).sum()
}

impl Revalidate for ViewCache {
    fn revalidate(&self, view: &str) {
        let dropped = self.lock().remove(view).map_or(0, |sessions| sessions.len());
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("view_cache_invalidations_total", "view" => view.to_string())
            .increment(1);
        debug!(view, dropped, "view cache invalidated");
    }
}
