//! Cached, deduplicating access to the earthquake feed.
//!
//! One `FeedClient` is shared by every consumer. Within the TTL window a
//! successful snapshot is served from memory; concurrent callers that miss
//! the cache join a single upstream request instead of issuing their own.

use std::sync::Arc;

use foundation::time::{Clock, SystemClock, Time};
use futures_util::FutureExt;
use futures_util::future::Shared;
use parking_lot::Mutex;
use runtime::metrics::{Metrics, MetricsSnapshot};
use scene::event::EventCollection;
use tracing::{debug, info, warn};

use crate::cache::{DEFAULT_TTL_MS, FeedCache};
use crate::error::FeedError;
use crate::protocol::decode_collection;
use crate::transport::{BoxFuture, FeedTransport, HttpTransport};

pub const USGS_ALL_DAY_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson";

pub type FeedResult = Result<Arc<EventCollection>, FeedError>;

type SharedFetch = Shared<BoxFuture<'static, FeedResult>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: String,
    pub ttl_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: USGS_ALL_DAY_URL.to_string(),
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

struct InFlight {
    generation: u64,
    started_at: Time,
    fetch: SharedFetch,
}

struct State {
    cache: FeedCache,
    in_flight: Option<InFlight>,
    next_generation: u64,
    metrics: Metrics,
}

pub struct FeedClient {
    transport: Arc<dyn FeedTransport>,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl FeedClient {
    pub fn new(transport: Arc<dyn FeedTransport>, clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            transport,
            clock,
            state: Mutex::new(State {
                cache: FeedCache::new(ttl_ms),
                in_flight: None,
                next_generation: 0,
                metrics: Metrics::new(),
            }),
        }
    }

    /// HTTP transport against `config.url`, wall clock.
    pub fn http(config: &FeedConfig) -> Self {
        Self::new(
            Arc::new(HttpTransport::new(config.url.clone())),
            Arc::new(SystemClock),
            config.ttl_ms,
        )
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub fn last_fetched_at(&self) -> Option<Time> {
        self.state.lock().cache.fetched_at()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.state.lock().metrics.snapshot()
    }

    /// Latest snapshot, from cache when fresh.
    ///
    /// Failures are returned to every joined caller and leave the cache
    /// untouched.
    pub async fn fetch(&self) -> FeedResult {
        let (generation, fetch) = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            if let Some(hit) = state.cache.get_fresh(now) {
                state.metrics.inc("feed.cache_hits");
                debug!("feed cache hit ({} events)", hit.len());
                return Ok(hit);
            }
            let joined = state
                .in_flight
                .as_ref()
                .map(|pending| (pending.generation, pending.fetch.clone()));
            match joined {
                Some(joined) => {
                    state.metrics.inc("feed.joined");
                    joined
                }
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    let fetch = self.start_fetch();
                    state.in_flight = Some(InFlight {
                        generation,
                        started_at: now,
                        fetch: fetch.clone(),
                    });
                    state.metrics.inc("feed.requests");
                    (generation, fetch)
                }
            }
        };

        let result = fetch.await;
        self.complete(generation, &result);
        result
    }

    /// Drops the cached snapshot and fetches again. Joins a request that is
    /// already in flight.
    pub async fn refresh(&self) -> FeedResult {
        self.state.lock().cache.invalidate();
        self.fetch().await
    }

    fn start_fetch(&self) -> SharedFetch {
        let transport = Arc::clone(&self.transport);
        let fut: BoxFuture<'static, FeedResult> = Box::pin(async move {
            let bytes = transport.get().await?;
            let collection = decode_collection(&bytes)?;
            Ok(Arc::new(collection))
        });
        fut.shared()
    }

    /// First joined caller to finish settles the request; the rest see it
    /// already cleared.
    fn complete(&self, generation: u64, result: &FeedResult) {
        let mut state = self.state.lock();
        let started_at = match &state.in_flight {
            Some(pending) if pending.generation == generation => pending.started_at,
            _ => return,
        };
        state.in_flight = None;

        let now = self.clock.now();
        let elapsed = i64::try_from(now.millis_since(started_at)).unwrap_or(i64::MAX);
        state.metrics.record("feed.fetch_ms", elapsed);

        match result {
            Ok(collection) => {
                state.cache.store(Arc::clone(collection), now);
                let count = i64::try_from(collection.len()).unwrap_or(i64::MAX);
                state.metrics.set_gauge("feed.events", count);
                info!("feed loaded: {} events in {elapsed} ms", collection.len());
            }
            Err(err) => {
                state.metrics.inc("feed.errors");
                warn!("feed fetch failed: {err}");
            }
        }
    }
}
