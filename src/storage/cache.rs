//! In-memory roster cache.
//!
//! Maps (term, subject) to a normalized document. Reads serve a cached entry
//! when one is fresh and otherwise run the full fetch, parse and normalize
//! pass. Concurrent misses on the same key are not coalesced; each runs its
//! own pass and the last one to finish owns the slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::Result;
use crate::models::{CachePolicy, Config, Document};
use crate::services::Normalizer;
use crate::utils::http::{RosterFetcher, roster_url};
use crate::utils::xml::XmlTreeParser;

/// Cache key: one roster page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub term: String,
    /// Empty for the subject index
    pub subject: String,
}

struct CacheEntry {
    document: Arc<Document>,
    stored_at: Instant,
}

/// State shared with the invalidation task.
struct Shared {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    policy: CachePolicy,
    period: Duration,
}

impl Shared {
    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        match self.policy {
            CachePolicy::WholeStore => true,
            CachePolicy::PerEntry => now.duration_since(entry.stored_at) < self.period,
        }
    }

    /// One invalidation tick.
    fn sweep(&self) {
        let mut entries = self.entries();
        let before = entries.len();
        match self.policy {
            CachePolicy::WholeStore => entries.clear(),
            CachePolicy::PerEntry => {
                let now = Instant::now();
                entries.retain(|_, entry| self.is_fresh(entry, now));
            }
        }
        log::info!(
            "Roster cache sweep: dropped {} of {} entries",
            before - entries.len(),
            before
        );
    }
}

/// Fetch-or-serve roster store.
///
/// Built explicitly and handed to callers. Invalidation only runs between
/// [`RosterStore::start`] and [`RosterStore::stop`] (or drop).
pub struct RosterStore {
    fetcher: Arc<dyn RosterFetcher>,
    parser: XmlTreeParser,
    normalizer: Normalizer,
    base_url: String,
    default_term: String,
    shared: Arc<Shared>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RosterStore {
    /// Create a store using `fetcher` for upstream requests.
    pub fn new(config: &Config, fetcher: Arc<dyn RosterFetcher>) -> Self {
        Self {
            fetcher,
            parser: XmlTreeParser::new(config.normalize.attribute_key.clone()),
            normalizer: Normalizer::new(config),
            base_url: config.roster.base_url.clone(),
            default_term: config.roster.default_term.clone(),
            shared: Arc::new(Shared {
                entries: Mutex::new(HashMap::new()),
                policy: config.cache.policy,
                period: config.cache.period(),
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Resolve optional caller arguments to a cache key.
    pub fn key(&self, subject: Option<&str>, term: Option<&str>) -> CacheKey {
        CacheKey {
            term: term.unwrap_or(&self.default_term).to_string(),
            subject: subject.unwrap_or_default().to_string(),
        }
    }

    /// Fetch, parse and normalize a page, then cache and return it.
    ///
    /// Always goes upstream. Nothing is cached when any step fails.
    pub async fn query(&self, subject: Option<&str>, term: Option<&str>) -> Result<Arc<Document>> {
        let key = self.key(subject, term);
        let url = roster_url(&self.base_url, &key.term, &key.subject)?;

        log::info!("Fetching roster page {}", url);
        let body = self.fetcher.fetch(&url).await?;

        let raw = self.parser.parse(&body)?;
        let document = Arc::new(self.normalizer.normalize(raw)?);
        log::debug!(
            "Normalized {} record(s) for term '{}' subject '{}'",
            document.len(),
            key.term,
            key.subject
        );

        self.shared.entries().insert(
            key,
            CacheEntry {
                document: Arc::clone(&document),
                stored_at: Instant::now(),
            },
        );
        Ok(document)
    }

    /// Serve a cached page when fresh, otherwise [`RosterStore::query`].
    pub async fn get_json(&self, subject: Option<&str>, term: Option<&str>) -> Result<Arc<Document>> {
        if let Some(document) = self.cached(&self.key(subject, term)) {
            return Ok(document);
        }
        self.query(subject, term).await
    }

    /// Cached document for `key`, if present and fresh.
    pub fn cached(&self, key: &CacheKey) -> Option<Arc<Document>> {
        let entries = self.shared.entries();
        entries
            .get(key)
            .filter(|entry| self.shared.is_fresh(entry, Instant::now()))
            .map(|entry| Arc::clone(&entry.document))
    }

    /// Drop every cached page.
    pub fn clear(&self) {
        self.shared.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.shared.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start periodic invalidation on the current tokio runtime.
    ///
    /// Does nothing if already started.
    pub fn start(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let period = shared.period;
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                shared.sweep();
            }
        }));
        log::info!("Roster cache invalidation started (every {:?})", period);
    }

    /// Stop periodic invalidation. Cached pages are kept.
    pub fn stop(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            log::info!("Roster cache invalidation stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for RosterStore {
    fn drop(&mut self) {
        self.stop();
    }
}
