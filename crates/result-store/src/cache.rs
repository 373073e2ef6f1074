use crate::ResultStore;
use crate::error::{CacheError, EvalFailure};
use core_types::{CacheKey, SelectionResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// What a finished flight broadcasts to everyone attached to it.
type FlightOutcome = Result<SelectionResult, EvalFailure>;

/// The compute-once, read-many result cache.
///
/// Durable entries live in the [`ResultStore`]; this layer adds single-flight
/// discipline on top: at most one computation per key is in progress at any
/// moment, and every caller waiting on that key receives the one outcome.
/// Computations run on detached tasks, so a caller disconnecting mid-request
/// never cancels work that siblings are waiting for.
///
/// Cloning is cheap; every clone shares the same store and flight table.
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    store: Arc<dyn ResultStore>,
    // Guards only the table structure; never held across an await.
    in_flight: Mutex<HashMap<CacheKey, broadcast::Sender<FlightOutcome>>>,
}

enum Role {
    Leader {
        tx: broadcast::Sender<FlightOutcome>,
        rx: broadcast::Receiver<FlightOutcome>,
    },
    Follower(broadcast::Receiver<FlightOutcome>),
}

impl ResultCache {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The durable store behind this cache, for read-only query paths that
    /// have no computation to fall back on.
    pub fn store(&self) -> Arc<dyn ResultStore> {
        Arc::clone(&self.inner.store)
    }

    /// Returns the durable result for `key`, or computes it at most once
    /// across all concurrent callers.
    ///
    /// With `use_cache` set, an existing durable entry is returned as-is and
    /// `compute` is never invoked; an unreadable entry is logged and treated
    /// as a miss rather than failing the request. On a miss, the first caller
    /// becomes the flight's leader and spawns the computation; everyone else
    /// arriving while it runs attaches to the same flight and receives the
    /// same outcome, success or failure. With `persist` set, a successful
    /// result is atomically published to the store before the flight ends; a
    /// failed persist is logged and the result still returned. A failed
    /// computation writes nothing and leaves the key free for retry.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        use_cache: bool,
        persist: bool,
        compute: F,
    ) -> Result<SelectionResult, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightOutcome> + Send + 'static,
    {
        if use_cache {
            match self.inner.store.get(&key).await {
                Ok(Some(result)) => {
                    tracing::debug!(key = %key, "Result cache hit");
                    return Ok(result);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "Result cache read failed; falling back to recompute"
                    );
                }
            }
        }

        let role = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(&key) {
                Some(tx) => Role::Follower(tx.subscribe()),
                None => {
                    // Capacity 1 suffices: each flight sends exactly one
                    // message, and all receivers subscribe before it is sent.
                    let (tx, rx) = broadcast::channel(1);
                    in_flight.insert(key.clone(), tx.clone());
                    Role::Leader { tx, rx }
                }
            }
        };

        let mut rx = match role {
            Role::Follower(rx) => {
                tracing::debug!(key = %key, "Attaching to computation already in flight");
                rx
            }
            Role::Leader { tx, rx } => {
                let inner = Arc::clone(&self.inner);
                let flight_key = key.clone();
                let computation = compute();
                tokio::spawn(async move {
                    inner.run_flight(flight_key, persist, tx, computation).await;
                });
                rx
            }
        };

        match rx.recv().await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(failure)) => Err(CacheError::Evaluation(failure)),
            Err(_) => Err(CacheError::Abandoned(key)),
        }
    }
}

impl CacheInner {
    /// Drives one flight to completion: compute, persist, unregister, send.
    ///
    /// Two orderings here are load-bearing:
    /// - The durable write lands before the flight is unregistered, so a
    ///   caller that finds neither a durable entry nor a flight can only be
    ///   ahead of both, never between them.
    /// - The flight is unregistered before the outcome is sent, so a caller
    ///   can never subscribe to a channel whose one message already passed.
    async fn run_flight<Fut>(
        &self,
        key: CacheKey,
        persist: bool,
        tx: broadcast::Sender<FlightOutcome>,
        computation: Fut,
    ) where
        Fut: Future<Output = FlightOutcome>,
    {
        let outcome = {
            // Unregisters the flight even if the computation panics; a stale
            // entry would pin every later caller to a dead channel.
            let _guard = FlightGuard {
                cache: self,
                key: &key,
            };

            match computation.await {
                Ok(result) => {
                    if persist {
                        if let Err(e) = self.store.put_atomic(&key, &result).await {
                            tracing::error!(
                                key = %key,
                                error = %e,
                                "Failed to persist computed result; returning it unpersisted"
                            );
                        }
                    }
                    Ok(result)
                }
                Err(failure) => {
                    tracing::warn!(
                        key = %key,
                        error = %failure,
                        "Computation failed; nothing written"
                    );
                    Err(failure)
                }
            }
        };

        // Everyone waiting subscribed before the guard above unregistered
        // the flight, so nobody can miss this. Zero receivers is fine.
        let _ = tx.send(outcome);
    }

    fn unregister(&self, key: &CacheKey) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.remove(key);
    }
}

struct FlightGuard<'a> {
    cache: &'a CacheInner,
    key: &'a CacheKey,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.cache.unregister(self.key);
    }
}
