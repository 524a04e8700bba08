//! A headless layout engine for large, sectioned, variable-size virtual lists.
//!
//! For scroll tracking, anchoring and host-event orchestration, see the `fastlist-adapter`
//! crate.
//!
//! This crate owns the geometry: it turns a list description (header, sections of items,
//! section footers, footer, insets) into offsets, indexes them in fixed-extent chunks, and
//! answers "what is in `[start, end)`?" without materializing offscreen content:
//! - uniform sections are stored as a single aggregate entry, so recomputation scales with the
//!   number of sections rather than items
//! - window queries are memoized and reuse chunk lookups across scroll positions
//! - presentation records keep stable keys across recomputations
//!
//! It is UI-agnostic. A host layer is expected to provide the viewport extent and to render the
//! returned [`FastListItem`]s.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod key;
mod layout;
mod options;
mod recycler;
mod types;

#[cfg(test)]
mod tests;

pub use error::ConfigError;
pub use layout::{DEFAULT_CHUNK_SIZE, LayoutComputer};
pub use options::{EdgeSize, ItemSize, LayoutOptions, SectionSize, Size};
pub use recycler::{KeyCounter, KeyRecycler};
pub use types::{EntryKind, FastListItem, ItemKey, Location, ScrollOrientation, VisibleWindow};
