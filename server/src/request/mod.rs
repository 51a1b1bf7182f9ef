use std::{collections::HashMap, time::Duration};

use log::warn;
use meridian_shared::{BigMapKey, KeyGenerator, Value};

use crate::events::WorldEvents;

// The Request Key

/// Handle to an in-flight remote call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RequestKey(u64);

impl BigMapKey for RequestKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        RequestKey(value)
    }
}

/// Retry policy for one remote call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    /// How many times the call is attempted before giving up.
    pub attempts: u32,
    /// Ticks allowed per attempt.
    pub timeout: u64,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            attempts: 10,
            timeout: 300,
        }
    }
}

/// Terminal result of a remote call, delivered through the event queues.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteOutcome {
    Completed(Value),
    Failed(String),
    TimedOut,
}

struct PendingRequest {
    target: String,
    attempts_left: u32,
    timeout: u64,
    ticks_left: u64,
}

/// Tracks every outstanding remote call and retires them on completion,
/// failure, abort, or timeout. Outcomes are buffered and flushed into the
/// tick's [`WorldEvents`] so callers observe them alongside everything else.
pub struct RequestManager {
    pending: HashMap<RequestKey, PendingRequest>,
    finished: Vec<(RequestKey, RemoteOutcome)>,
    key_generator: KeyGenerator<RequestKey>,
}

impl RequestManager {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            finished: Vec::new(),
            key_generator: KeyGenerator::new(Duration::from_secs(60)),
        }
    }

    /// Register a new outgoing call and hand back its key.
    pub fn queue(&mut self, target: &str, options: RequestOptions) -> RequestKey {
        let key = self.key_generator.generate();
        let attempts = options.attempts.max(1);
        self.pending.insert(
            key,
            PendingRequest {
                target: target.to_string(),
                attempts_left: attempts,
                timeout: options.timeout.max(1),
                ticks_left: options.timeout.max(1),
            },
        );
        key
    }

    pub fn is_pending(&self, key: &RequestKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop an in-flight call without producing an outcome. Returns whether
    /// the key referred to a live request.
    pub fn abort(&mut self, key: &RequestKey) -> bool {
        if let Some(request) = self.pending.remove(key) {
            self.key_generator.recycle_key(key);
            warn!("aborted remote call to {}", request.target);
            return true;
        }
        false
    }

    /// Resolve a call with a response payload.
    pub fn complete(&mut self, key: &RequestKey, value: Value) -> bool {
        if self.pending.remove(key).is_some() {
            self.key_generator.recycle_key(key);
            self.finished.push((*key, RemoteOutcome::Completed(value)));
            return true;
        }
        false
    }

    /// Resolve a call with a remote-side error.
    pub fn fail(&mut self, key: &RequestKey, reason: &str) -> bool {
        if self.pending.remove(key).is_some() {
            self.key_generator.recycle_key(key);
            self.finished
                .push((*key, RemoteOutcome::Failed(reason.to_string())));
            return true;
        }
        false
    }

    /// Advance every pending call by one tick. An attempt that runs out of
    /// ticks either rolls into the next attempt or times the call out.
    pub fn tick(&mut self, events: &mut WorldEvents) {
        let mut expired = Vec::new();
        for (key, request) in self.pending.iter_mut() {
            request.ticks_left -= 1;
            if request.ticks_left > 0 {
                continue;
            }
            request.attempts_left -= 1;
            if request.attempts_left == 0 {
                warn!("remote call to {} timed out", request.target);
                expired.push(*key);
            } else {
                request.ticks_left = request.timeout;
            }
        }
        for key in expired {
            self.pending.remove(&key);
            self.key_generator.recycle_key(&key);
            self.finished.push((key, RemoteOutcome::TimedOut));
        }

        for (key, outcome) in self.finished.drain(..) {
            events.push_remote_response(key, outcome);
        }
    }
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RemoteResponseEvent, WorldEvents};

    #[test]
    fn completion_is_delivered_on_the_next_tick() {
        let mut manager = RequestManager::new();
        let mut events = WorldEvents::new();

        let key = manager.queue("fetch_stats", RequestOptions::default());
        assert!(manager.is_pending(&key));

        manager.complete(&key, Value::Int(7));
        assert!(!manager.is_pending(&key));

        manager.tick(&mut events);
        let responses: Vec<_> = events.read::<RemoteResponseEvent>().collect();
        assert_eq!(responses, vec![(key, RemoteOutcome::Completed(Value::Int(7)))]);
    }

    #[test]
    fn call_times_out_after_attempts_times_timeout_ticks() {
        let mut manager = RequestManager::new();
        let mut events = WorldEvents::new();

        let key = manager.queue(
            "fetch_stats",
            RequestOptions {
                attempts: 2,
                timeout: 3,
            },
        );

        for _ in 0..5 {
            manager.tick(&mut events);
            assert!(manager.is_pending(&key));
        }
        manager.tick(&mut events);
        assert!(!manager.is_pending(&key));

        let responses: Vec<_> = events.read::<RemoteResponseEvent>().collect();
        assert_eq!(responses, vec![(key, RemoteOutcome::TimedOut)]);
    }

    #[test]
    fn aborted_call_produces_no_outcome() {
        let mut manager = RequestManager::new();
        let mut events = WorldEvents::new();

        let key = manager.queue(
            "fetch_stats",
            RequestOptions {
                attempts: 1,
                timeout: 1,
            },
        );
        assert!(manager.abort(&key));
        assert!(!manager.abort(&key));

        manager.tick(&mut events);
        assert!(!events.has::<RemoteResponseEvent>());
    }
}
