//! Property tests for layout geometry and key recycling.

use fastlist::{EntryKind, FastListItem, LayoutComputer, LayoutOptions};
use proptest::prelude::*;

fn sizes_strategy() -> impl Strategy<Value = (Vec<usize>, u32, u32, u32, u32)> {
    (
        prop::collection::vec(0usize..40, 0..8),
        0u32..60,
        0u32..30,
        0u32..20,
        0u32..20,
    )
}

fn per_item(s: usize, i: usize) -> u32 {
    ((s * 31 + i * 17) % 23) as u32
}

proptest! {
    #[test]
    fn locate_is_the_sum_of_preceding_sizes(
        (sections, header, section, inset_start, inset_end) in sizes_strategy(),
        dynamic in any::<bool>(),
    ) {
        let mut opts = LayoutOptions::new(sections.clone(), 12)
            .with_header_size(header)
            .with_footer_size(header / 2)
            .with_section_size(section)
            .with_section_footer_size(section / 3)
            .with_insets(inset_start, inset_end);
        if dynamic {
            opts = opts.with_item_size_fn(per_item);
        }
        let item_size = |s: usize, i: usize| if dynamic { per_item(s, i) } else { 12 };

        let mut l = LayoutComputer::new(opts);
        l.set_viewport_extent(300);

        let mut offset = u64::from(inset_start) + u64::from(header);
        for (s, &count) in sections.iter().enumerate() {
            let loc = l.locate(s, None).unwrap();
            prop_assert_eq!(loc.offset, offset);
            offset += u64::from(section);
            for i in 0..count {
                let loc = l.locate(s, Some(i)).unwrap();
                prop_assert_eq!(loc.offset, offset);
                prop_assert_eq!(loc.section_offset, u64::from(section));
                offset += u64::from(item_size(s, i));
            }
            prop_assert!(l.locate(s, Some(count)).is_none());
            offset += u64::from(section / 3);
        }
        prop_assert!(l.locate(sections.len(), None).is_none());

        let total = offset + u64::from(header / 2) + u64::from(inset_end);
        prop_assert_eq!(l.total_size(), total);
    }

    #[test]
    fn windows_tile_the_content_with_unique_keys(
        (sections, header, section, _, _) in sizes_strategy(),
        viewport in 1u32..500,
        starts in prop::collection::vec(0u64..5_000, 1..12),
        exact in any::<bool>(),
        sticky in any::<bool>(),
    ) {
        let opts = LayoutOptions::new(sections, 0)
            .with_item_size_fn(per_item)
            .with_header_size(header)
            .with_footer_size(header)
            .with_section_size(section)
            .with_sticky_header_footer(sticky);
        let mut l = LayoutComputer::new(opts);
        l.set_viewport_extent(viewport);

        let mut prev: Vec<FastListItem> = Vec::new();
        for start in starts {
            let w = l.visible(start, start + u64::from(viewport), &prev, exact).clone();

            let mut cursor = 0u64;
            for it in &w.items {
                prop_assert_eq!(it.layout_start, cursor);
                prop_assert!(it.layout_size > 0);
                cursor = it.layout_end();
            }
            prop_assert_eq!(cursor, w.size);

            let mut keys: Vec<_> = w.items.iter().map(|it| it.key).collect();
            keys.sort_unstable();
            keys.dedup();
            prop_assert_eq!(keys.len(), w.items.len());

            for it in w.items.iter().filter(|it| it.kind != EntryKind::Spacer) {
                if let Some(p) = prev.iter().find(|p| {
                    p.kind == it.kind && p.section == it.section && p.item == it.item
                }) {
                    prop_assert_eq!(p.key, it.key);
                }
            }
            prev = w.items;
        }
    }
}
