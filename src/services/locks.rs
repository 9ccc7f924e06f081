use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-identity login locks. A second concurrent login for the same identity
/// would clobber the shared checkpoint mid-flow, so each identity runs at
/// most one login at a time. Different identities proceed independently.
#[derive(Default)]
pub struct LoginLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LoginLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_identity(&self, identity: &str) -> Arc<Mutex<()>> {
        // A strong count of 1 means only the map holds the lock; no login
        // can be using it. Drop those before handing out another.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.locks
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
