//! Shared known-identifier registry
//!
//! The registry owns the known set and the discovered followers sink behind
//! a single lock, so the membership check, the append and the insert happen
//! as one step no matter how many users are crawled at once.

use crate::store::traits::{RecordSink, StoreError, StoreResult};
use crate::Identifier;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

struct RegistryInner {
    known: HashSet<Identifier>,
    sink: Box<dyn RecordSink + Send>,
}

/// Known set plus its append target
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    /// Creates a registry seeded with `known`
    pub fn new(known: HashSet<Identifier>, sink: impl RecordSink + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                known,
                sink: Box::new(sink),
            }),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, RegistryInner>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Records an identifier if it has not been seen before
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The identifier was new and has been appended
    /// * `Ok(false)` - The identifier was already known, nothing written
    /// * `Err(StoreError)` - The append failed; the identifier stays unknown
    pub fn record(&self, identifier: &str) -> StoreResult<bool> {
        let mut inner = self.lock()?;
        if inner.known.contains(identifier) {
            return Ok(false);
        }

        inner.sink.append(identifier)?;
        inner.known.insert(identifier.to_string());
        Ok(true)
    }

    /// Returns true if the identifier is already known
    pub fn contains(&self, identifier: &str) -> StoreResult<bool> {
        Ok(self.lock()?.known.contains(identifier))
    }

    /// Number of known identifiers
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.known.len())
    }

    /// Returns true if no identifier is known yet
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}
