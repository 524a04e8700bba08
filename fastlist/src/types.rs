use alloc::vec::Vec;

/// Identity keys handed out to presentation records.
pub type ItemKey = u64;

/// The kind of list content a record or layout entry represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryKind {
    Header,
    Footer,
    Section,
    SectionFooter,
    Item,
    Spacer,
}

/// Where to place a target entry when scrolling to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollOrientation {
    /// Align the entry's start with the viewport start (below its section header).
    #[default]
    Top,
    /// Scroll the least amount needed to make the entry fully visible.
    Visible,
    /// Center the entry in the viewport.
    Center,
}

/// The externally visible unit of a computed window.
///
/// `key` stays stable for a `(kind, section, item)` identity for as long as that identity is
/// present in consecutive windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FastListItem {
    pub kind: EntryKind,
    pub key: ItemKey,
    /// Start offset in the scroll axis.
    pub layout_start: u64,
    /// Size in the scroll axis.
    pub layout_size: u64,
    pub section: usize,
    pub item: usize,
}

impl FastListItem {
    pub fn layout_end(&self) -> u64 {
        self.layout_start.saturating_add(self.layout_size)
    }
}

/// The result of a visible-window query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleWindow {
    /// Total content size along the scroll axis.
    pub size: u64,
    /// Records ordered by `layout_start`, including synthesized spacers.
    pub items: Vec<FastListItem>,
}

/// Geometry of a located section header or item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub offset: u64,
    pub size: u64,
    /// Size of the section header sitting above a located item (`0` for the header itself).
    pub section_offset: u64,
}

impl Location {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    pub fn midpoint(&self) -> u64 {
        self.offset.saturating_add(self.size / 2)
    }
}
