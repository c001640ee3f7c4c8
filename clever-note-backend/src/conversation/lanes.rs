//! Per-user lane serialization
//!
//! Every inbound event for a user (command, button press, free text) runs to
//! completion before the next one for the same user starts. Different users
//! are processed in parallel. This closes the double-submission race on the
//! record log rewrite and on the draft read-modify-write.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Lanes held longer than this are logged
const LANE_HOLD_WARNING_SECS: u64 = 10;

/// Above this many tracked lanes, idle ones are pruned on acquire
const MAX_USER_LANES: usize = 10_000;

/// Time after which an idle lane can be pruned
const LANE_IDLE_TIMEOUT_SECS: u64 = 3600;

/// Guard that releases the user's lane when dropped
pub struct UserLaneGuard {
    user_id: u64,
    _permit: OwnedSemaphorePermit,
    acquired_at: Instant,
    manager: Arc<UserLaneManager>,
}

impl Drop for UserLaneGuard {
    fn drop(&mut self) {
        let held = self.acquired_at.elapsed();
        if held.as_secs() > LANE_HOLD_WARNING_SECS {
            log::warn!(
                "[LANES] User {} lane held for {} seconds (unusually long)",
                self.user_id,
                held.as_secs()
            );
        }
        if let Some(mut last_used) = self.manager.last_used.get_mut(&self.user_id) {
            *last_used = Instant::now();
        }
    }
}

/// One single-permit semaphore per user
pub struct UserLaneManager {
    lanes: DashMap<u64, Arc<Semaphore>>,
    last_used: DashMap<u64, Instant>,
}

impl UserLaneManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            lanes: DashMap::new(),
            last_used: DashMap::new(),
        })
    }

    /// Wait for exclusive access to the user's lane
    pub async fn acquire(self: &Arc<Self>, user_id: u64) -> UserLaneGuard {
        if self.lanes.len() > MAX_USER_LANES {
            self.prune_idle_lanes(Duration::from_secs(LANE_IDLE_TIMEOUT_SECS));
        }

        let semaphore = self.get_or_create_lane(user_id);
        let permit = semaphore
            .acquire_owned()
            .await
            .expect("lane semaphores are never closed");
        self.last_used.insert(user_id, Instant::now());

        UserLaneGuard {
            user_id,
            _permit: permit,
            acquired_at: Instant::now(),
            manager: Arc::clone(self),
        }
    }

    /// Drop lanes unused for longer than `idle`.
    ///
    /// A lane is only removed while the map holds its sole reference, checked
    /// under the shard lock. A task that cloned the lane but has not acquired
    /// it yet keeps it alive, so a user never ends up with two lanes.
    pub fn prune_idle_lanes(&self, idle: Duration) {
        let now = Instant::now();
        let stale: Vec<u64> = self
            .last_used
            .iter()
            .filter(|e| now.duration_since(*e.value()) > idle)
            .map(|e| *e.key())
            .collect();

        for user_id in stale {
            let removed = self
                .lanes
                .remove_if(&user_id, |_, lane| Arc::strong_count(lane) == 1)
                .is_some();
            if removed {
                self.last_used.remove(&user_id);
            }
        }
    }

    fn get_or_create_lane(&self, user_id: u64) -> Arc<Semaphore> {
        self.lanes
            .entry(user_id)
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone()
    }
}
