//! Build cache: per-key build records for memoization and cycle detection.
//!
//! A record is created the moment a thread claims a key and is never removed.
//! While the claiming thread builds, the record is in progress and owned by
//! that thread: a request from the same thread is a cycle, a request from any
//! other thread blocks until the record settles as done or failed.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::error::DiError;
use crate::key::Key;
use crate::registration::AnyArc;

/// Observable state of a key's build record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// Claimed by a builder that has not finished yet
    InProgress,
    /// Built and wired; the instance is memoized
    Done,
    /// The build failed; the error is memoized
    Failed,
}

enum Record {
    InProgress {
        owner: ThreadId,
        provisional: Option<AnyArc>,
    },
    Done(AnyArc),
    Failed(DiError),
}

impl Record {
    fn status(&self) -> BuildStatus {
        match self {
            Record::InProgress { .. } => BuildStatus::InProgress,
            Record::Done(_) => BuildStatus::Done,
            Record::Failed(_) => BuildStatus::Failed,
        }
    }
}

/// Outcome of [`BuildCache::claim`].
pub(crate) enum Claim<'a> {
    /// Memoization hit.
    Ready(AnyArc),
    /// A previous build of this key failed.
    Failed(DiError),
    /// The calling thread is already building this key.
    Reentrant(Option<AnyArc>),
    /// The caller is now the exclusive builder.
    Owned(ClaimGuard<'a>),
}

#[derive(Default)]
pub(crate) struct BuildCache {
    records: Mutex<HashMap<Key, Record>>,
    settled: Condvar,
}

impl BuildCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reads the record for `key`, or claims it when absent.
    ///
    /// Callers check the registration table first, so a claim is only ever
    /// made for a key with a bound factory. Blocks while another thread holds
    /// the key in progress.
    pub(crate) fn claim(&self, key: &Key) -> Claim<'_> {
        let me = thread::current().id();
        let mut records = self.records.lock();

        loop {
            let waiting = match records.get(key) {
                None => false,
                Some(Record::Done(instance)) => return Claim::Ready(instance.clone()),
                Some(Record::Failed(err)) => return Claim::Failed(err.clone()),
                Some(Record::InProgress { owner, provisional }) if *owner == me => {
                    return Claim::Reentrant(provisional.clone());
                }
                Some(Record::InProgress { .. }) => true,
            };
            if !waiting {
                break;
            }
            tracing::trace!(key = %key, "Waiting for build on another thread");
            self.settled.wait(&mut records);
        }

        records.insert(key.clone(), Record::InProgress { owner: me, provisional: None });
        Claim::Owned(ClaimGuard {
            cache: self,
            key: key.clone(),
            settled: false,
        })
    }

    pub(crate) fn status(&self, key: &Key) -> Option<BuildStatus> {
        self.records.lock().get(key).map(Record::status)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().len()
    }

    fn settle(&self, key: &Key, record: Record) {
        self.records.lock().insert(key.clone(), record);
        self.settled.notify_all();
    }
}

/// Exclusive right to build one key.
///
/// Dropping the guard without settling it (a factory or wiring panic) records
/// [`DiError::FactoryPanicked`] so waiters are released.
pub(crate) struct ClaimGuard<'a> {
    cache: &'a BuildCache,
    key: Key,
    settled: bool,
}

impl ClaimGuard<'_> {
    /// Publishes the raw instance so re-entrant lenient requests can see it.
    pub(crate) fn provide(&self, instance: AnyArc) {
        if let Some(Record::InProgress { provisional, .. }) = self.cache.records.lock().get_mut(&self.key) {
            *provisional = Some(instance);
        }
    }

    pub(crate) fn finish(mut self, instance: AnyArc) {
        self.settled = true;
        self.cache.settle(&self.key, Record::Done(instance));
    }

    pub(crate) fn fail(mut self, err: DiError) {
        self.settled = true;
        self.cache.settle(&self.key, Record::Failed(err));
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.cache
                .settle(&self.key, Record::Failed(DiError::FactoryPanicked(self.key.clone())));
        }
    }
}
