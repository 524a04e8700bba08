use alloc::vec::Vec;
use core::ops::Range;

use crate::recycler::{KeyCounter, KeyRecycler};
use crate::{EntryKind, FastListItem, LayoutOptions, Location, VisibleWindow};

/// Chunk extent used before the host has reported a viewport.
pub const DEFAULT_CHUNK_SIZE: u64 = 256;

const SPACER_LEADING: usize = 0;
const SPACER_AFTER_HEADER: usize = 1;
const SPACER_BEFORE_FOOTER: usize = 2;
const SPACER_TRAILING: usize = 3;

/// Chunk extent for a viewport: a quarter of it, rounded up.
pub(crate) fn chunk_size_for(viewport_extent: u32) -> u64 {
    if viewport_extent == 0 {
        return DEFAULT_CHUNK_SIZE;
    }
    u64::from(viewport_extent.div_ceil(4))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Single,
    /// `count` consecutive items of `item_size`, starting at item index `Entry::item`.
    Uniform { count: usize, item_size: u32 },
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    kind: EntryKind,
    start: u64,
    size: u64,
    section: usize,
    item: usize,
    shape: Shape,
}

impl Entry {
    fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    /// Pushes the parts of this entry that intersect `[lo, hi)`.
    fn place_within(&self, lo: u64, hi: u64, out: &mut Vec<Placed>) {
        if self.size == 0 || self.start >= hi || self.end() <= lo {
            return;
        }
        match self.shape {
            Shape::Single => out.push(Placed {
                kind: self.kind,
                start: self.start,
                size: self.size,
                section: self.section,
                item: self.item,
            }),
            Shape::Uniform { count, item_size } => {
                let item_size = u64::from(item_size);
                let first = (lo.max(self.start) - self.start) / item_size;
                let last = (hi.min(self.end()) - 1 - self.start) / item_size;
                let last = last.min(count as u64 - 1);
                for i in first..=last {
                    out.push(Placed {
                        kind: EntryKind::Item,
                        start: self.start + i * item_size,
                        size: item_size,
                        section: self.section,
                        item: self.item + i as usize,
                    });
                }
            }
        }
    }
}

/// A concrete, unkeyed record inside a window.
#[derive(Clone, Copy, Debug)]
struct Placed {
    kind: EntryKind,
    start: u64,
    size: u64,
    section: usize,
    item: usize,
}

#[derive(Clone, Debug)]
struct Chunk {
    start: u64,
    end: u64,
    /// Every entry intersecting `[start, end)`.
    entries: Range<usize>,
}

#[derive(Clone, Copy, Debug)]
struct SectionLayout {
    start: u64,
    header_size: u64,
    items_start: u64,
    count: usize,
    /// Index of the first item entry; only meaningful for non-uniform sections.
    first_entry: usize,
    uniform: Option<u32>,
}

#[derive(Clone, Debug)]
struct Memo {
    start: u64,
    end: u64,
    exact: bool,
    window: VisibleWindow,
}

/// Geometry engine for a sectioned list.
///
/// Owns per-entry offsets and sizes plus a chunked spatial index over them. All geometry is
/// rebuilt lazily: configuration or viewport changes only mark the layout dirty, and the next
/// query runs a single [`LayoutComputer::full_recompute`].
#[derive(Clone, Debug)]
pub struct LayoutComputer {
    options: LayoutOptions,
    viewport_extent: u32,
    chunk_size: u64,
    dirty: bool,
    generation: u64,

    entries: Vec<Entry>,
    chunks: Vec<Chunk>,
    sections: Vec<SectionLayout>,
    header: Option<usize>,
    footer: Option<usize>,
    total_size: u64,

    last_chunk: usize,
    memo: Option<Memo>,
    counter: KeyCounter,
}

impl Default for LayoutComputer {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}

impl LayoutComputer {
    pub fn new(options: LayoutOptions) -> Self {
        Self::with_key_counter(options, KeyCounter::new())
    }

    /// Creates a layout computer that mints keys from a shared counter.
    pub fn with_key_counter(options: LayoutOptions, counter: KeyCounter) -> Self {
        Self {
            options,
            viewport_extent: 0,
            chunk_size: chunk_size_for(0),
            dirty: true,
            generation: 0,
            entries: Vec::new(),
            chunks: Vec::new(),
            sections: Vec::new(),
            header: None,
            footer: None,
            total_size: 0,
            last_chunk: 0,
            memo: None,
            counter,
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn key_counter(&self) -> &KeyCounter {
        &self.counter
    }

    /// Replaces the configuration. Returns `true` if it differs from the current one, in which
    /// case the layout is now dirty.
    pub fn configure(&mut self, options: LayoutOptions) -> bool {
        if self.options == options {
            return false;
        }
        vtrace!(sections = options.sections.len(), "LayoutComputer::configure");
        self.options = options;
        self.dirty = true;
        true
    }

    /// Sets the viewport extent along the scroll axis. Returns `true` if it changed.
    pub fn set_viewport_extent(&mut self, extent: u32) -> bool {
        if self.viewport_extent == extent {
            return false;
        }
        self.viewport_extent = extent;
        self.chunk_size = chunk_size_for(extent);
        self.dirty = true;
        true
    }

    pub fn viewport_extent(&self) -> u32 {
        self.viewport_extent
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of full recomputations performed so far.
    pub fn layout_generation(&self) -> u64 {
        self.generation
    }

    pub fn total_size(&mut self) -> u64 {
        self.ensure_fresh();
        self.total_size
    }

    pub fn chunk_count(&mut self) -> usize {
        self.ensure_fresh();
        self.chunks.len()
    }

    /// Number of stored entries. Uniform sections count as a single entry.
    pub fn entry_count(&mut self) -> usize {
        self.ensure_fresh();
        self.entries.len()
    }

    /// Largest valid scroll offset for the current viewport.
    pub fn max_scroll_offset(&mut self) -> u64 {
        let total = self.total_size();
        total.saturating_sub(u64::from(self.viewport_extent))
    }

    pub fn clamp_scroll_offset(&mut self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    fn ensure_fresh(&mut self) {
        if self.dirty {
            self.full_recompute();
        }
    }

    /// Rebuilds every entry, the section table, and the chunk index in one pass.
    pub fn full_recompute(&mut self) {
        self.entries.clear();
        self.sections.clear();
        self.header = None;
        self.footer = None;

        let mut offset = u64::from(self.options.inset_start);

        let header_size = u64::from(self.options.header_size.resolve());
        if header_size > 0 {
            self.header = Some(self.entries.len());
            self.entries.push(Entry {
                kind: EntryKind::Header,
                start: offset,
                size: header_size,
                section: 0,
                item: 0,
                shape: Shape::Single,
            });
            offset += header_size;
        }

        let uniform = self.options.item_size.fixed();
        for (section, &count) in self.options.sections.iter().enumerate() {
            let start = offset;
            let section_header = u64::from(self.options.section_size.resolve(section));
            if section_header > 0 {
                self.entries.push(Entry {
                    kind: EntryKind::Section,
                    start: offset,
                    size: section_header,
                    section,
                    item: 0,
                    shape: Shape::Single,
                });
                offset += section_header;
            }

            let items_start = offset;
            let first_entry = self.entries.len();
            match uniform {
                Some(item_size) => {
                    let span = u64::from(item_size) * count as u64;
                    if span > 0 {
                        self.entries.push(Entry {
                            kind: EntryKind::Item,
                            start: offset,
                            size: span,
                            section,
                            item: 0,
                            shape: Shape::Uniform { count, item_size },
                        });
                    }
                    offset += span;
                }
                None => {
                    // Zero-size items are kept so `first_entry + item` stays addressable.
                    for item in 0..count {
                        let size = u64::from(self.options.item_size.resolve(section, item));
                        self.entries.push(Entry {
                            kind: EntryKind::Item,
                            start: offset,
                            size,
                            section,
                            item,
                            shape: Shape::Single,
                        });
                        offset += size;
                    }
                }
            }

            let section_footer = u64::from(self.options.section_footer_size.resolve(section));
            if section_footer > 0 {
                self.entries.push(Entry {
                    kind: EntryKind::SectionFooter,
                    start: offset,
                    size: section_footer,
                    section,
                    item: 0,
                    shape: Shape::Single,
                });
                offset += section_footer;
            }

            self.sections.push(SectionLayout {
                start,
                header_size: section_header,
                items_start,
                count,
                first_entry,
                uniform,
            });
        }

        let footer_size = u64::from(self.options.footer_size.resolve());
        if footer_size > 0 {
            self.footer = Some(self.entries.len());
            self.entries.push(Entry {
                kind: EntryKind::Footer,
                start: offset,
                size: footer_size,
                section: 0,
                item: 0,
                shape: Shape::Single,
            });
            offset += footer_size;
        }

        self.total_size = offset + u64::from(self.options.inset_end);
        self.build_chunks();

        self.dirty = false;
        self.memo = None;
        self.last_chunk = 0;
        self.generation += 1;
        vdebug!(
            entries = self.entries.len(),
            chunks = self.chunks.len(),
            total_size = self.total_size,
            generation = self.generation,
            "LayoutComputer::full_recompute"
        );
    }

    fn build_chunks(&mut self) {
        self.chunks.clear();
        let cs = self.chunk_size;
        let total = self.total_size;
        let n = total.div_ceil(cs) as usize;
        self.chunks.reserve_exact(n);

        let entries = &self.entries;
        let mut lo = 0usize;
        let mut hi = 0usize;
        for c in 0..n {
            let start = c as u64 * cs;
            let end = start.saturating_add(cs).min(total);
            while lo < entries.len() && entries[lo].end() <= start {
                lo += 1;
            }
            hi = hi.max(lo);
            while hi < entries.len() && entries[hi].start < end {
                hi += 1;
            }
            self.chunks.push(Chunk {
                start,
                end,
                entries: lo..hi,
            });
        }
    }

    /// Index of the chunk containing `offset` (clamped to the last chunk).
    ///
    /// Scrolling mostly queries the same or the next chunk, so the last hit is checked before
    /// falling back to a binary search.
    fn chunk_index_at(&mut self, offset: u64) -> usize {
        debug_assert!(!self.chunks.is_empty());
        let cached = self.last_chunk;
        for idx in [cached, cached + 1] {
            if let Some(c) = self.chunks.get(idx) {
                if c.start <= offset && offset < c.end {
                    self.last_chunk = idx;
                    return idx;
                }
            }
        }
        let idx = self
            .chunks
            .partition_point(|c| c.end <= offset)
            .min(self.chunks.len() - 1);
        self.last_chunk = idx;
        idx
    }

    /// Returns the records that fall in `[start, end)`, padded with spacers to the full content
    /// extent.
    ///
    /// With `exact = false` every entry of every chunk overlapping the range is included, which
    /// keeps the output stable while scrolling. With `exact = true` only entries that actually
    /// intersect the range are included.
    ///
    /// Keys of `previous` are recycled by identity. Repeating the previous call's arguments on
    /// unchanged geometry returns the memoized window.
    pub fn visible(
        &mut self,
        start: u64,
        end: u64,
        previous: &[FastListItem],
        exact: bool,
    ) -> &VisibleWindow {
        self.ensure_fresh();
        let memo = match self.memo.take() {
            Some(m) if m.start == start && m.end == end && m.exact == exact => m,
            _ => Memo {
                start,
                end,
                exact,
                window: self.compute_window(start, end, previous, exact),
            },
        };
        &self.memo.insert(memo).window
    }

    fn compute_window(
        &mut self,
        start: u64,
        end: u64,
        previous: &[FastListItem],
        exact: bool,
    ) -> VisibleWindow {
        let total = self.total_size;
        let end = end.min(total);
        let start = start.min(end);

        let mut content = Vec::new();
        if start < end && !self.chunks.is_empty() {
            let first = self.chunk_index_at(start);
            let last = self.chunk_index_at(end - 1);
            let (lo, hi) = if exact {
                (start, end)
            } else {
                (self.chunks[first].start, self.chunks[last].end)
            };
            let range = self.chunks[first].entries.start..self.chunks[last].entries.end;
            for entry in &self.entries[range] {
                entry.place_within(lo, hi, &mut content);
            }
        }
        vtrace!(start, end, exact, records = content.len(), "compute_window");

        let sticky = self.options.sticky_header_footer;
        let header = self
            .header
            .filter(|_| sticky)
            .map(|i| self.entries[i])
            .filter(|_| !content.first().is_some_and(|p| p.kind == EntryKind::Header));
        let footer = self
            .footer
            .filter(|_| sticky)
            .map(|i| self.entries[i])
            .filter(|_| !content.last().is_some_and(|p| p.kind == EntryKind::Footer));

        let mut b = WindowBuilder {
            recycler: KeyRecycler::new(previous, &self.counter),
            cursor: 0,
        };
        if let Some(h) = header {
            b.spacer_to(h.start, SPACER_LEADING);
            b.place(h.kind, h.start, h.size, h.section, h.item);
        }
        let gap_role = if header.is_some() {
            SPACER_AFTER_HEADER
        } else {
            SPACER_LEADING
        };
        for (i, p) in content.iter().enumerate() {
            if i == 0 {
                b.spacer_to(p.start, gap_role);
            }
            b.place(p.kind, p.start, p.size, p.section, p.item);
        }
        if let Some(f) = footer {
            let role = if content.is_empty() {
                gap_role
            } else {
                SPACER_BEFORE_FOOTER
            };
            b.spacer_to(f.start, role);
            b.place(f.kind, f.start, f.size, f.section, f.item);
        }
        b.spacer_to(total, SPACER_TRAILING);

        VisibleWindow {
            size: total,
            items: b.recycler.finalize(),
        }
    }

    /// Locates a section header (`item = None`) or an item.
    ///
    /// Returns `None` when the section or item does not exist.
    pub fn locate(&mut self, section: usize, item: Option<usize>) -> Option<Location> {
        self.ensure_fresh();
        let s = self.sections.get(section)?;
        let Some(item) = item else {
            return Some(Location {
                offset: s.start,
                size: s.header_size,
                section_offset: 0,
            });
        };
        if item >= s.count {
            return None;
        }
        let (offset, size) = match s.uniform {
            Some(item_size) => {
                let item_size = u64::from(item_size);
                (s.items_start + item as u64 * item_size, item_size)
            }
            None => {
                let e = &self.entries[s.first_entry + item];
                (e.start, e.size)
            }
        };
        Some(Location {
            offset,
            size,
            section_offset: s.header_size,
        })
    }

    /// The chunk indexes covering a target entry plus `trailing_padding` after it.
    ///
    /// Scroll destinations are bounded by [`LayoutComputer::chunk_bounds`] of this range.
    pub fn chunk_range_for(
        &mut self,
        section: usize,
        item: Option<usize>,
        trailing_padding: u64,
    ) -> Option<Range<usize>> {
        let loc = self.locate(section, item)?;
        if self.chunks.is_empty() {
            return Some(0..0);
        }
        let last_offset = self.total_size - 1;
        let from = loc.offset.min(last_offset);
        let to = loc
            .end()
            .saturating_add(trailing_padding)
            .saturating_sub(1)
            .clamp(from, last_offset);
        let first = self.chunk_index_at(from);
        let last = self.chunk_index_at(to);
        Some(first..last + 1)
    }

    /// Pixel bounds `[start, end)` of a chunk range.
    pub fn chunk_bounds(&mut self, range: Range<usize>) -> Option<(u64, u64)> {
        self.ensure_fresh();
        if range.is_empty() {
            return None;
        }
        let first = self.chunks.get(range.start)?;
        let last = self.chunks.get(range.end - 1)?;
        Some((first.start, last.end))
    }
}

struct WindowBuilder<'a> {
    recycler: KeyRecycler<'a>,
    cursor: u64,
}

impl WindowBuilder<'_> {
    fn spacer_to(&mut self, until: u64, role: usize) {
        if until <= self.cursor {
            return;
        }
        self.recycler.resolve(
            EntryKind::Spacer,
            self.cursor,
            until - self.cursor,
            0,
            role,
        );
        self.cursor = until;
    }

    fn place(&mut self, kind: EntryKind, start: u64, size: u64, section: usize, item: usize) {
        debug_assert!(start >= self.cursor, "records must be placed in order");
        if start > self.cursor {
            vwarn!(start, cursor = self.cursor, "gap inside a computed window");
        }
        self.recycler.resolve(kind, start, size, section, item);
        self.cursor = start.saturating_add(size);
    }
}
