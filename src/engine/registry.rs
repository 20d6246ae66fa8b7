//! Live bodies, each behind its own lock
//!
//! Single writer per body: every mutation goes through `lock`, which never
//! waits. Different bodies can be mutated from different threads at once.

use ahash::AHashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use tracing::warn;

use crate::core::error::{EngineError, Result};
use crate::core::types::BodyId;
use crate::entity::Body;

pub type BodyHandle = Arc<Mutex<Body>>;

#[derive(Debug, Default)]
pub struct BodyRegistry {
    bodies: RwLock<AHashMap<BodyId, BodyHandle>>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `DuplicateBody` if a body with the same id is live
    pub fn insert(&self, body: Body) -> Result<BodyId> {
        let id = body.id();
        let mut bodies = self.bodies.write().unwrap_or_else(PoisonError::into_inner);
        if bodies.contains_key(&id) {
            return Err(EngineError::DuplicateBody(id));
        }
        bodies.insert(id, Arc::new(Mutex::new(body)));
        Ok(id)
    }

    pub fn remove(&self, id: BodyId) -> Option<BodyHandle> {
        self.bodies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    pub fn handle(&self, id: BodyId) -> Option<BodyHandle> {
        self.bodies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every handle, sorted by body id so iteration order is stable
    pub fn handles(&self) -> Vec<(BodyId, BodyHandle)> {
        let mut handles: Vec<_> = self
            .bodies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, handle)| (*id, Arc::clone(handle)))
            .collect();
        handles.sort_by_key(|(id, _)| *id);
        handles
    }
}

/// Take exclusive access to a body. Tries twice, then reports a conflict.
pub fn lock(id: BodyId, handle: &BodyHandle) -> Result<MutexGuard<'_, Body>> {
    for attempt in 0..2 {
        match handle.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!(body = %id, "body lock poisoned by an earlier panic; continuing");
                return Ok(poisoned.into_inner());
            }
            Err(TryLockError::WouldBlock) if attempt == 0 => std::thread::yield_now(),
            Err(TryLockError::WouldBlock) => {}
        }
    }
    warn!(body = %id, "body is locked by another mutation");
    Err(EngineError::ConcurrentMutationConflict(id))
}
