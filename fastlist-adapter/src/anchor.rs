use core::fmt;

use fastlist::{EntryKind, FastListItem};

/// An item whose viewport offset should survive a re-layout.
#[derive(Clone, PartialEq, Eq)]
pub struct Anchor<I> {
    pub id: I,
    pub section: usize,
    pub item: usize,
    /// Item start minus scroll offset. Negative when the item begins above the viewport.
    pub offset_in_viewport: i64,
}

impl<I: fmt::Debug> fmt::Debug for Anchor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("id", &self.id)
            .field("section", &self.section)
            .field("item", &self.item)
            .field("offset_in_viewport", &self.offset_in_viewport)
            .finish()
    }
}

/// Where an anchor resolved to under the current data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorTarget {
    pub section: usize,
    pub item: usize,
    pub offset_in_viewport: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum AnchorState<I> {
    None,
    /// Picked from the first visible item on refresh; dropped by the next refresh.
    Auto(Anchor<I>),
    /// Installed by a programmatic scroll; kept until the user drags.
    Custom(Anchor<I>),
}

/// Keeps a chosen item at a fixed viewport offset across content changes.
///
/// Usage per relayout: `refresh` with the old data, apply the change, `consume` with the new
/// data, then scroll to `locate(target).offset - target.offset_in_viewport`. `consume` is
/// one-shot until the next `refresh` or `pin_custom`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollAnchor<I> {
    state: AnchorState<I>,
    armed: bool,
}

impl<I> Default for ScrollAnchor<I> {
    fn default() -> Self {
        Self {
            state: AnchorState::None,
            armed: false,
        }
    }
}

impl<I: Clone + PartialEq> ScrollAnchor<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Option<&Anchor<I>> {
        match &self.state {
            AnchorState::None => None,
            AnchorState::Auto(a) | AnchorState::Custom(a) => Some(a),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.state, AnchorState::Custom(_))
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Re-captures the anchor from the records currently on screen.
    pub fn refresh(
        &mut self,
        id_from_index: impl Fn(usize, usize) -> I,
        items: &[FastListItem],
        scroll_offset: u64,
    ) {
        if let AnchorState::Custom(anchor) = &mut self.state {
            if let Some(rec) = items.iter().find(|rec| {
                rec.kind == EntryKind::Item && id_from_index(rec.section, rec.item) == anchor.id
            }) {
                anchor.section = rec.section;
                anchor.item = rec.item;
                anchor.offset_in_viewport = signed_delta(rec.layout_start, scroll_offset);
            }
            self.armed = true;
            return;
        }

        self.state = match items
            .iter()
            .find(|rec| rec.kind == EntryKind::Item && rec.layout_start >= scroll_offset)
        {
            Some(rec) => AnchorState::Auto(Anchor {
                id: id_from_index(rec.section, rec.item),
                section: rec.section,
                item: rec.item,
                offset_in_viewport: signed_delta(rec.layout_start, scroll_offset),
            }),
            None => AnchorState::None,
        };
        self.armed = !matches!(self.state, AnchorState::None);
        vtrace!(armed = self.armed, "ScrollAnchor::refresh");
    }

    pub fn pin_custom(
        &mut self,
        id: I,
        section: usize,
        item: usize,
        item_start: u64,
        scroll_offset: u64,
    ) {
        self.state = AnchorState::Custom(Anchor {
            id,
            section,
            item,
            offset_in_viewport: signed_delta(item_start, scroll_offset),
        });
        self.armed = true;
    }

    /// Drops a custom anchor. Auto anchors are left alone.
    pub fn clear_custom(&mut self) {
        if self.is_custom() {
            self.state = AnchorState::None;
            self.armed = false;
        }
    }

    pub fn clear(&mut self) {
        self.state = AnchorState::None;
        self.armed = false;
    }

    /// Resolves the anchor id against the current section counts and disarms it.
    ///
    /// The previously captured `(section, item)` is tried first; otherwise every item is scanned
    /// in order. Returns `None` if nothing is armed or the id no longer exists.
    pub fn consume(
        &mut self,
        sections: &[usize],
        id_from_index: impl Fn(usize, usize) -> I,
    ) -> Option<AnchorTarget> {
        if !core::mem::take(&mut self.armed) {
            return None;
        }
        let is_custom = self.is_custom();
        let anchor = self.anchor()?.clone();
        if !is_custom {
            self.state = AnchorState::None;
        }

        let still_there = sections
            .get(anchor.section)
            .is_some_and(|&count| anchor.item < count)
            && id_from_index(anchor.section, anchor.item) == anchor.id;
        let found = if still_there {
            Some((anchor.section, anchor.item))
        } else {
            sections.iter().enumerate().find_map(|(section, &count)| {
                (0..count)
                    .find(|&item| id_from_index(section, item) == anchor.id)
                    .map(|item| (section, item))
            })
        };
        let Some((section, item)) = found else {
            vdebug!("anchor id no longer present");
            return None;
        };

        if let AnchorState::Custom(a) = &mut self.state {
            a.section = section;
            a.item = item;
        }
        Some(AnchorTarget {
            section,
            item,
            offset_in_viewport: anchor.offset_in_viewport,
        })
    }
}

fn signed_delta(start: u64, scroll_offset: u64) -> i64 {
    if start >= scroll_offset {
        i64::try_from(start - scroll_offset).unwrap_or(i64::MAX)
    } else {
        i64::try_from(scroll_offset - start).map_or(i64::MIN, |d| -d)
    }
}
