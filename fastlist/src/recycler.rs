use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::key::{Identity, IdentityMap};
use crate::{EntryKind, FastListItem, ItemKey};

/// A shared, monotonically increasing source of [`ItemKey`]s.
///
/// Every [`crate::LayoutComputer`] owns one by default. Clone the handle and pass it to
/// `LayoutComputer::with_key_counter` to make several lists draw from the same sequence.
#[derive(Clone, Debug, Default)]
pub struct KeyCounter(Arc<AtomicU64>);

impl KeyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh key, never returned before by this counter (or its clones).
    pub fn next_key(&self) -> ItemKey {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// The number of keys minted so far.
    pub fn minted(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Assigns keys to one generation of presentation records, reusing the previous generation's
/// keys wherever possible.
///
/// Usage: call [`KeyRecycler::resolve`] once per record in output order, then
/// [`KeyRecycler::finalize`] to obtain the keyed records.
pub struct KeyRecycler<'a> {
    counter: &'a KeyCounter,
    /// Previous generation, in order. `None` once the key has been claimed.
    pool: Vec<Option<ItemKey>>,
    by_identity: IdentityMap<usize>,
    out: Vec<FastListItem>,
    /// Indexes into `out` still waiting for a key.
    pending: Vec<usize>,
}

impl<'a> KeyRecycler<'a> {
    pub fn new(previous: &[FastListItem], counter: &'a KeyCounter) -> Self {
        let mut by_identity = IdentityMap::new();
        let mut pool = Vec::with_capacity(previous.len());
        for (i, prev) in previous.iter().enumerate() {
            let id = Identity {
                kind: prev.kind,
                section: prev.section,
                item: prev.item,
            };
            // A well-formed generation never repeats an identity; keep the first if it does.
            by_identity.entry(id).or_insert(i);
            pool.push(Some(prev.key));
        }
        Self {
            counter,
            pool,
            by_identity,
            out: Vec::with_capacity(previous.len()),
            pending: Vec::new(),
        }
    }

    pub fn resolve(&mut self, kind: EntryKind, start: u64, size: u64, section: usize, item: usize) {
        let id = Identity {
            kind,
            section,
            item,
        };
        let key = self
            .by_identity
            .remove(&id)
            .and_then(|slot| self.pool[slot].take());
        if key.is_none() {
            self.pending.push(self.out.len());
        }
        self.out.push(FastListItem {
            kind,
            key: key.unwrap_or_default(),
            layout_start: start,
            layout_size: size,
            section,
            item,
        });
    }

    /// Hands unclaimed previous keys to pending records in order, then mints new keys for the
    /// rest.
    pub fn finalize(mut self) -> Vec<FastListItem> {
        let mut leftovers = self.pool.iter().filter_map(|k| *k);
        for &slot in &self.pending {
            let key = leftovers.next().unwrap_or_else(|| self.counter.next_key());
            self.out[slot].key = key;
        }
        vtrace!(
            records = self.out.len(),
            pending = self.pending.len(),
            "KeyRecycler::finalize"
        );
        self.out
    }
}
