// Input plumbing between a gamepad producer and the control loop
//
// Producers (keyboard, scripted replay, a real device poller) run on their own
// timeline and publish whole `GamepadState` values. The runtime takes one snapshot
// per tick. A state is replaced as a unit under the lock so the two sticks can
// never tear.

pub mod keyboard;
pub mod script;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::messages::{GamepadState, InputHealth};

#[derive(Debug)]
struct Published {
    state: GamepadState,
    at: Option<Instant>,
}

/// Shared cell holding the latest published gamepad state
#[derive(Debug, Clone)]
pub struct GamepadFeed {
    inner: Arc<Mutex<Published>>,
}

/// A tick's view of the feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub state: GamepadState,
    pub health: InputHealth,
}

impl Default for GamepadFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl GamepadFeed {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Published {
                state: GamepadState::neutral(),
                at: None,
            })),
        }
    }

    /// Replace the current state. Values are sanitized on the way in.
    pub fn publish(&self, state: GamepadState) {
        let state = state.sanitized();
        // A poisoned lock only means a producer panicked mid-publish; the data is a
        // plain value so recovering it is fine.
        let mut published = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        published.state = state;
        published.at = Some(Instant::now());
    }

    /// Read the latest state.
    ///
    /// With a `timeout`, a state older than the timeout (or no state at all) reads as
    /// neutral with [`InputHealth::Stale`].
    pub fn snapshot(&self, timeout: Option<Duration>) -> Snapshot {
        let published = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = match (timeout, published.at) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(limit), Some(at)) => at.elapsed() <= limit,
        };

        if fresh {
            Snapshot {
                state: published.state,
                health: InputHealth::Ok,
            }
        } else {
            Snapshot {
                state: GamepadState::neutral(),
                health: InputHealth::Stale,
            }
        }
    }
}
