use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;

fn uniform(sections: &[usize], item_size: u32, viewport: u32) -> LayoutComputer {
    let mut l = LayoutComputer::new(LayoutOptions::new(sections, item_size));
    l.set_viewport_extent(viewport);
    l
}

fn kinds(window: &VisibleWindow) -> Vec<EntryKind> {
    window.items.iter().map(|it| it.kind).collect()
}

fn item_indexes(window: &VisibleWindow) -> Vec<(usize, usize)> {
    window
        .items
        .iter()
        .filter(|it| it.kind == EntryKind::Item)
        .map(|it| (it.section, it.item))
        .collect()
}

fn assert_tiles_content(window: &VisibleWindow) {
    let mut cursor = 0u64;
    for it in &window.items {
        assert_eq!(it.layout_start, cursor, "records must be contiguous: {it:?}");
        cursor = it.layout_end();
    }
    assert_eq!(cursor, window.size);
}

fn assert_unique_keys(window: &VisibleWindow) {
    let mut keys: Vec<ItemKey> = window.items.iter().map(|it| it.key).collect();
    keys.sort_unstable();
    let len = keys.len();
    keys.dedup();
    assert_eq!(keys.len(), len, "duplicate keys in {:?}", window.items);
}

#[test]
fn uniform_sections_total_and_locate() {
    let mut l = uniform(&[3, 5], 40, 400);
    assert_eq!(l.total_size(), 320);

    let loc = l.locate(1, Some(2)).unwrap();
    // 3 items of section 0 (120) + 2 items into section 1 (80)
    assert_eq!(loc.offset, 200);
    assert_eq!(loc.size, 40);
    assert_eq!(loc.section_offset, 0);
}

#[test]
fn locate_accounts_for_headers_footers_and_insets() {
    let opts = LayoutOptions::new([2, 3], 10)
        .with_insets(3, 4)
        .with_header_size(10)
        .with_section_size(20)
        .with_section_footer_size(5)
        .with_footer_size(7);
    let mut l = LayoutComputer::new(opts);

    // inset(3) header(10) | s0: header(20) items(2x10) footer(5) | s1: header(20) items(3x10)
    // footer(5) | footer(7) inset(4)
    assert_eq!(l.total_size(), 124);

    assert_eq!(
        l.locate(1, None),
        Some(Location {
            offset: 58,
            size: 20,
            section_offset: 0
        })
    );
    assert_eq!(
        l.locate(1, Some(2)),
        Some(Location {
            offset: 98,
            size: 10,
            section_offset: 20
        })
    );
    assert_eq!(l.locate(0, Some(0)).map(|loc| loc.offset), Some(33));
}

#[test]
fn locate_misses_are_none() {
    let mut l = uniform(&[3, 5], 40, 400);
    assert_eq!(l.locate(2, None), None);
    assert_eq!(l.locate(0, Some(3)), None);
    assert_eq!(l.locate(1, Some(5)), None);
    assert_eq!(l.chunk_range_for(7, Some(0), 0), None);
}

#[test]
fn per_index_sizes_sum_preceding_entries() {
    let size = |s: usize, i: usize| 10 + ((s * 7 + i) % 5) as u32;
    let opts = LayoutOptions::new([4, 6], 0)
        .with_item_size_fn(size)
        .with_section_size(3);
    let mut l = LayoutComputer::new(opts);

    let mut expected = 0u64;
    for (s, count) in [4usize, 6].into_iter().enumerate() {
        expected += 3;
        for i in 0..count {
            let loc = l.locate(s, Some(i)).unwrap();
            assert_eq!(loc.offset, expected, "section={s} item={i}");
            assert_eq!(loc.size, u64::from(size(s, i)));
            expected += u64::from(size(s, i));
        }
    }
    assert_eq!(l.total_size(), expected);
}

#[test]
fn uniform_sections_are_stored_as_aggregates() {
    let mut l = uniform(&[1_000, 1_000, 0], 20, 400);
    assert_eq!(l.entry_count(), 2);
    assert_eq!(l.total_size(), 40_000);

    let mut dynamic = LayoutComputer::new(
        LayoutOptions::new([1_000, 1_000], 0).with_item_size_fn(|_, _| 20),
    );
    dynamic.set_viewport_extent(400);
    assert_eq!(dynamic.entry_count(), 2_000);
    assert_eq!(dynamic.total_size(), 40_000);
}

#[test]
fn value_equal_configure_does_not_mark_dirty() {
    let mut l = uniform(&[3, 5], 40, 400);
    assert_eq!(l.total_size(), 320);
    let generation = l.layout_generation();

    assert!(!l.configure(LayoutOptions::new([3, 5], 40)));
    assert!(!l.is_dirty());
    assert_eq!(l.total_size(), 320);
    assert_eq!(l.layout_generation(), generation);

    assert!(l.configure(LayoutOptions::new([3, 6], 40)));
    assert!(l.is_dirty());
    assert_eq!(l.total_size(), 360);
    assert_eq!(l.layout_generation(), generation + 1);
}

#[test]
fn size_functions_compare_by_identity() {
    let f: Arc<dyn Fn(usize, usize) -> u32 + Send + Sync> = Arc::new(|_: usize, _: usize| 10);
    let mut opts = LayoutOptions::new([5], 0);
    opts.item_size = ItemSize::Dynamic(Arc::clone(&f));
    let mut l = LayoutComputer::new(opts.clone());
    assert_eq!(l.total_size(), 50);

    assert!(!l.configure(opts.clone()));
    assert!(l.configure(opts.with_item_size_fn(|_, _| 10)));
}

#[test]
fn viewport_change_rebuilds_chunks() {
    let mut l = uniform(&[100], 40, 400);
    assert_eq!(l.chunk_size(), 100);
    assert_eq!(l.chunk_count(), 40);

    assert!(!l.set_viewport_extent(400));
    assert!(!l.is_dirty());

    assert!(l.set_viewport_extent(801));
    assert!(l.is_dirty());
    assert_eq!(l.chunk_size(), 201);
    assert_eq!(l.chunk_count(), 20);
}

#[test]
fn exact_window_only_includes_intersecting_items() {
    let mut l = uniform(&[100], 40, 400);
    let w = l.visible(50, 250, &[], true).clone();
    assert_eq!(
        item_indexes(&w),
        (1..=6).map(|i| (0, i)).collect::<Vec<_>>()
    );
    assert_eq!(w.items.first().map(|it| (it.kind, it.layout_size)), Some((EntryKind::Spacer, 40)));
    assert_eq!(w.size, 4_000);
    assert_tiles_content(&w);
}

#[test]
fn chunk_window_includes_whole_overlapping_chunks() {
    let mut l = uniform(&[100], 40, 400);
    // Chunks are 100px; [50, 250) overlaps chunks 0..=2, i.e. [0, 300).
    let w = l.visible(50, 250, &[], false).clone();
    assert_eq!(
        item_indexes(&w),
        (0..=7).map(|i| (0, i)).collect::<Vec<_>>()
    );
    assert_eq!(w.items.first().map(|it| it.kind), Some(EntryKind::Item));
    assert_tiles_content(&w);
}

#[test]
fn window_past_the_end_is_clamped() {
    let mut l = uniform(&[100], 40, 400);
    let w = l.visible(3_900, 9_000, &[], true).clone();
    assert_eq!(item_indexes(&w), [(0, 97), (0, 98), (0, 99)]);
    assert_tiles_content(&w);

    let empty = l.visible(9_000, 9_500, &[], true).clone();
    assert_eq!(kinds(&empty), [EntryKind::Spacer]);
    assert_tiles_content(&empty);
}

#[test]
fn repeated_query_is_memoized() {
    let mut l = uniform(&[100], 40, 400);
    let a = l.visible(0, 400, &[], true).clone();
    let generation = l.layout_generation();
    let minted = l.key_counter().minted();
    assert_eq!(minted, a.items.len() as u64);

    let b = l.visible(0, 400, &a.items, true).clone();
    assert_eq!(a, b);
    assert_eq!(l.layout_generation(), generation);
    assert_eq!(l.key_counter().minted(), minted);
}

#[test]
fn memo_is_dropped_after_configuration_change() {
    let mut l = uniform(&[100], 40, 400);
    let a = l.visible(0, 400, &[], true).clone();
    l.configure(LayoutOptions::new([100], 50));
    let b = l.visible(0, 400, &a.items, true).clone();
    assert_eq!(b.size, 5_000);
    assert_eq!(item_indexes(&b).len(), 8);
}

#[test]
fn keys_are_stable_for_identities_present_in_both_generations() {
    let mut l = uniform(&[100], 40, 400);
    let a = l.visible(0, 400, &[], true).clone();
    let b = l.visible(200, 600, &a.items, true).clone();
    assert_unique_keys(&b);

    for it in b.items.iter().filter(|it| it.kind == EntryKind::Item) {
        if let Some(prev) = a
            .items
            .iter()
            .find(|p| p.kind == EntryKind::Item && p.item == it.item)
        {
            assert_eq!(prev.key, it.key, "item {} changed key", it.item);
        }
    }

    // 10 items + trailing spacer first, then 6 new records of which 5 recycle the keys of
    // items 0..5 that scrolled out.
    assert_eq!(l.key_counter().minted(), 12);
}

#[test]
fn keys_never_collide_across_many_scroll_positions() {
    let mut l = uniform(&[30, 500, 12], 33, 320);
    let mut prev = Vec::new();
    for step in 0..200u64 {
        let start = (step * 397) % 17_000;
        let w = l.visible(start, start + 320, &prev, step % 3 == 0).clone();
        assert_unique_keys(&w);
        assert_tiles_content(&w);
        prev = w.items;
    }
}

#[test]
fn sticky_header_and_footer_are_always_present() {
    let opts = LayoutOptions::new([100], 40)
        .with_header_size(50)
        .with_footer_size(30)
        .with_sticky_header_footer(true);
    let mut l = LayoutComputer::new(opts);
    l.set_viewport_extent(400);

    let w = l.visible(2_000, 2_400, &[], true).clone();
    let mut expected = Vec::new();
    expected.push(EntryKind::Header);
    expected.push(EntryKind::Spacer);
    expected.extend(core::iter::repeat_n(EntryKind::Item, 11));
    expected.push(EntryKind::Spacer);
    expected.push(EntryKind::Footer);
    assert_eq!(kinds(&w), expected);
    assert_eq!(item_indexes(&w).first(), Some(&(0, 48)));
    assert_tiles_content(&w);

    // At the top the header is part of the content and is not duplicated.
    let top = l.visible(0, 400, &w.items, true).clone();
    assert_eq!(
        kinds(&top)
            .iter()
            .filter(|k| **k == EntryKind::Header)
            .count(),
        1
    );
    assert_eq!(top.items.last().map(|it| it.kind), Some(EntryKind::Footer));
    assert_tiles_content(&top);
}

#[test]
fn non_sticky_header_scrolls_away() {
    let opts = LayoutOptions::new([100], 40)
        .with_header_size(50)
        .with_footer_size(30);
    let mut l = LayoutComputer::new(opts);
    l.set_viewport_extent(400);
    let w = l.visible(2_000, 2_400, &[], true).clone();
    assert!(!kinds(&w).contains(&EntryKind::Header));
    assert!(!kinds(&w).contains(&EntryKind::Footer));
}

#[test]
fn section_headers_and_footers_appear_in_windows() {
    let opts = LayoutOptions::new([2, 2], 10)
        .with_section_size_fn(|s| 5 + s as u32)
        .with_section_footer_size(4);
    let mut l = LayoutComputer::new(opts);
    l.set_viewport_extent(200);
    let w = l.visible(0, 200, &[], true).clone();
    assert_eq!(
        kinds(&w),
        [
            EntryKind::Section,
            EntryKind::Item,
            EntryKind::Item,
            EntryKind::SectionFooter,
            EntryKind::Section,
            EntryKind::Item,
            EntryKind::Item,
            EntryKind::SectionFooter,
        ]
    );
    assert_eq!(w.size, 5 + 20 + 4 + 6 + 20 + 4);
    assert_tiles_content(&w);
}

#[test]
fn zero_sized_items_are_never_rendered() {
    let opts = LayoutOptions::new([5], 0).with_item_size_fn(|_, i| if i == 2 { 0 } else { 10 });
    let mut l = LayoutComputer::new(opts);
    l.set_viewport_extent(100);
    let w = l.visible(0, 100, &[], true).clone();
    assert_eq!(item_indexes(&w), [(0, 0), (0, 1), (0, 3), (0, 4)]);
    assert_eq!(l.locate(0, Some(3)).map(|loc| loc.offset), Some(20));
}

#[test]
fn chunk_range_covers_target_and_padding() {
    let mut l = uniform(&[100], 40, 400);
    // item 10 is [400, 440)
    assert_eq!(l.chunk_range_for(0, Some(10), 0), Some(4..5));
    assert_eq!(l.chunk_range_for(0, Some(10), 400), Some(4..9));
    assert_eq!(l.chunk_bounds(4..9), Some((400, 900)));

    // Padding past the end is clamped to the last chunk.
    assert_eq!(l.chunk_range_for(0, Some(99), 10_000), Some(39..40));
    assert_eq!(l.chunk_bounds(0..0), None);
}

#[test]
fn empty_list_has_no_records() {
    let mut l = uniform(&[], 40, 400);
    assert_eq!(l.total_size(), 0);
    assert_eq!(l.chunk_count(), 0);
    let w = l.visible(0, 400, &[], true).clone();
    assert!(w.items.is_empty());
    assert_eq!(l.max_scroll_offset(), 0);
}

#[test]
fn shared_key_counter_spans_layouts() {
    let counter = KeyCounter::new();
    let mut a = LayoutComputer::with_key_counter(LayoutOptions::new([10], 10), counter.clone());
    let mut b = LayoutComputer::with_key_counter(LayoutOptions::new([10], 10), counter.clone());
    a.set_viewport_extent(100);
    b.set_viewport_extent(100);

    let wa = a.visible(0, 100, &[], true).clone();
    let wb = b.visible(0, 100, &[], true).clone();
    let max_a = wa.items.iter().map(|it| it.key).max().unwrap();
    let min_b = wb.items.iter().map(|it| it.key).min().unwrap();
    assert!(min_b > max_a);
    assert_eq!(counter.minted(), 20);
}

#[test]
fn clamp_scroll_offset_uses_viewport() {
    let mut l = uniform(&[3, 5], 40, 100);
    assert_eq!(l.max_scroll_offset(), 220);
    assert_eq!(l.clamp_scroll_offset(1_000), 220);
    assert_eq!(l.clamp_scroll_offset(10), 10);
}

#[test]
fn recycler_reuses_leftover_keys_in_order() {
    let counter = KeyCounter::new();
    let previous = [
        FastListItem {
            kind: EntryKind::Item,
            key: 7,
            layout_start: 0,
            layout_size: 10,
            section: 0,
            item: 0,
        },
        FastListItem {
            kind: EntryKind::Item,
            key: 3,
            layout_start: 10,
            layout_size: 10,
            section: 0,
            item: 1,
        },
    ];
    let mut r = KeyRecycler::new(&previous, &counter);
    r.resolve(EntryKind::Item, 10, 10, 0, 1);
    r.resolve(EntryKind::Item, 20, 10, 0, 2);
    r.resolve(EntryKind::Item, 30, 10, 0, 3);
    let out = r.finalize();

    assert_eq!(out[0].key, 3);
    assert_eq!(out[1].key, 7);
    assert_eq!(out[2].key, 0);
    assert_eq!(counter.minted(), 1);
}
