//! Parsed-email cache keyed by container path, with single-flight parsing.
//!
//! When several callers miss on the same container before the first parse
//! completes, only the first ("leader") reads and parses the file; the others
//! ("waiters") subscribe to the leader's result. Failures are fanned out to
//! the waiters but never cached, so the next access parses from scratch.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SharedError, VfsError};
use crate::model::mail::{FileMeta, ParsedEmail};
use crate::parser::eml::load_eml;
use crate::vfs::path::ContainerKind;

/// Capacity of the invalidation event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

type FlightResult = std::result::Result<Arc<ParsedEmail>, SharedError>;

/// What the cache holds for a container path.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// The parsed representation.
    Parsed(Arc<ParsedEmail>),
    /// The extension is recognized but no parser exists for it.
    Unsupported(ContainerKind),
}

/// Why a cached entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationKind {
    /// The container was modified on disk and will be re-parsed.
    Changed,
    /// The container no longer exists or cannot be stat'ed.
    Deleted,
}

/// A cached entry that went stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub path: PathBuf,
    pub kind: InvalidationKind,
}

/// Cache counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    parses: AtomicU64,
    hits: AtomicU64,
    coalesced: AtomicU64,
    failures: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheStats {
    /// Number of parses started (one per leader).
    pub fn parses(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }

    /// Number of lookups answered from memory.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that waited on another caller's parse.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    /// Number of parses that failed.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Number of entries dropped because the backing file changed or vanished.
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

struct Inner {
    ready: LruCache<PathBuf, Arc<ParsedEmail>>,
    in_flight: HashMap<PathBuf, broadcast::Sender<FlightResult>>,
}

/// Memoizes [`ParsedEmail`]s per container file.
///
/// Owned by the filesystem adapter; nothing here is process-global.
pub struct EmailCache {
    inner: Mutex<Inner>,
    stats: CacheStats,
    max_container_size: u64,
    revalidate: bool,
    events: broadcast::Sender<Invalidation>,
}

impl EmailCache {
    /// Create a cache holding up to `capacity` parsed emails.
    pub fn new(capacity: usize, max_container_size: u64, revalidate: bool) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                ready: LruCache::new(capacity),
                in_flight: HashMap::new(),
            }),
            stats: CacheStats::default(),
            max_container_size,
            revalidate,
            events,
        }
    }

    /// Create a cache from the `[cache]` and `[filesystem]` config sections.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache.capacity,
            config.filesystem.max_container_size,
            config.cache.revalidate,
        )
    }

    /// Get the parsed representation of a container, parsing it on a miss.
    ///
    /// Concurrent misses for the same path share a single parse.
    pub async fn get(&self, path: &Path) -> Result<Lookup> {
        match ContainerKind::from_path(path) {
            Some(ContainerKind::Eml) => {}
            Some(kind) => {
                debug!(path = %path.display(), %kind, "No parser for container kind");
                return Ok(Lookup::Unsupported(kind));
            }
            None => return Err(VfsError::InvalidUri(path.display().to_string())),
        }

        let current = if self.revalidate {
            Some(tokio::fs::metadata(path).await.map(|m| FileMeta::from_metadata(&m)))
        } else {
            None
        };

        let waiter = {
            let mut inner = self.lock();
            let cached = inner.ready.get(path).cloned();
            if let Some(email) = cached {
                match &current {
                    Some(Ok(meta))
                        if meta.modified_at != email.modified_at || meta.size != email.size =>
                    {
                        self.evict(&mut inner, path, InvalidationKind::Changed);
                    }
                    Some(Err(_)) => self.evict(&mut inner, path, InvalidationKind::Deleted),
                    _ => {
                        CacheStats::bump(&self.stats.hits);
                        debug!(path = %path.display(), "Cache hit");
                        return Ok(Lookup::Parsed(email));
                    }
                }
            }

            match inner.in_flight.get(path) {
                Some(sender) => {
                    CacheStats::bump(&self.stats.coalesced);
                    Some(sender.subscribe())
                }
                None => {
                    let (sender, _) = broadcast::channel(1);
                    inner.in_flight.insert(path.to_path_buf(), sender);
                    None
                }
            }
        };

        match waiter {
            Some(mut receiver) => match receiver.recv().await {
                Ok(result) => result.map(Lookup::Parsed).map_err(VfsError::Shared),
                Err(_) => Err(VfsError::Cancelled(path.to_path_buf())),
            },
            None => self.lead(path).await.map(Lookup::Parsed),
        }
    }

    /// Parse as the leader and publish the result to any waiters.
    async fn lead(&self, path: &Path) -> Result<Arc<ParsedEmail>> {
        let mut flight = FlightGuard {
            cache: self,
            path,
            armed: true,
        };

        CacheStats::bump(&self.stats.parses);
        info!(path = %path.display(), "Parsing email");
        let result: FlightResult = load_eml(path, self.max_container_size)
            .await
            .map(Arc::new)
            .map_err(SharedError::from);
        flight.armed = false;

        let mut inner = self.lock();
        let sender = inner.in_flight.remove(path);
        match &result {
            Ok(email) => {
                inner.ready.put(path.to_path_buf(), Arc::clone(email));
            }
            Err(e) => {
                CacheStats::bump(&self.stats.failures);
                warn!(path = %path.display(), error = %e, "Failed to parse email");
            }
        }
        if let Some(sender) = sender {
            // No receivers just means nobody else was waiting.
            let _ = sender.send(result.clone());
        }
        drop(inner);

        result.map_err(VfsError::Shared)
    }

    fn evict(&self, inner: &mut Inner, path: &Path, kind: InvalidationKind) {
        inner.ready.pop(path);
        CacheStats::bump(&self.stats.invalidations);
        info!(path = %path.display(), ?kind, "Cached email is stale");
        let _ = self.events.send(Invalidation {
            path: path.to_path_buf(),
            kind,
        });
    }

    /// Drop the cached entry for `path`, if any. In-flight parses are unaffected.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.lock().ready.pop(path).is_some()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.lock().ready.clear();
    }

    /// Number of parsed emails currently held.
    pub fn len(&self) -> usize {
        self.lock().ready.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cache counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Receive an [`Invalidation`] whenever a cached entry goes stale.
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EmailCache {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Clears the in-flight slot if the leader is dropped mid-parse, so waiters
/// see the channel close and later callers start a fresh parse.
struct FlightGuard<'a> {
    cache: &'a EmailCache,
    path: &'a Path,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(path = %self.path.display(), "Email parse cancelled");
            self.cache.lock().in_flight.remove(self.path);
        }
    }
}
