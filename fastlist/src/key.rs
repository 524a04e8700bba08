#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

use crate::EntryKind;

/// The identity a presentation record is recycled by: `(kind, section, item)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Identity {
    pub(crate) kind: EntryKind,
    pub(crate) section: usize,
    pub(crate) item: usize,
}

#[cfg(feature = "std")]
pub(crate) type IdentityMap<V> = HashMap<Identity, V>;
#[cfg(not(feature = "std"))]
pub(crate) type IdentityMap<V> = BTreeMap<Identity, V>;
