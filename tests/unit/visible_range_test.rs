// Windowed rendering: which rows get materialized for a scroll position

use proptest::prelude::*;
use resource_grid::grid::visible_range;

#[test]
fn test_small_viewport_rounds_partial_rows_up() {
    // 130px viewport over 52px rows shows parts of 3 rows
    assert_eq!(visible_range(100, 52, 130, 0, 0), 0..3);
}

#[test]
fn test_viewport_taller_than_content() {
    assert_eq!(visible_range(4, 52, 600, 0, 5), 0..4);
    assert_eq!(visible_range(4, 52, 600, 400, 5), 0..4);
}

#[test]
fn test_overscan_is_clamped_at_the_top() {
    assert_eq!(visible_range(500, 50, 500, 100, 5), 0..17);
}

proptest! {
    #[test]
    fn test_range_stays_inside_the_rows(
        row_count in 0usize..5000,
        row_height in 1u32..200,
        viewport in 0u32..2000,
        scroll in 0u32..1_000_000,
        overscan in 0usize..20
    ) {
        let range = visible_range(row_count, row_height, viewport, scroll, overscan);
        prop_assert!(range.start <= range.end);
        prop_assert!(range.end <= row_count);
        if row_count > 0 {
            prop_assert!(!range.is_empty());
        }
    }

    #[test]
    fn test_range_size_is_bounded_by_viewport(
        row_count in 1usize..5000,
        row_height in 1u32..200,
        viewport in 0u32..2000,
        scroll in 0u32..1_000_000,
        overscan in 0usize..20
    ) {
        let range = visible_range(row_count, row_height, viewport, scroll, overscan);
        let visible = (viewport.div_ceil(row_height) as usize).max(1);
        prop_assert!(range.len() <= visible + 2 * overscan);
    }

    #[test]
    fn test_row_under_scroll_offset_is_materialized(
        row_count in 1usize..5000,
        row_height in 1u32..200,
        viewport in 1u32..2000,
        scroll in 0u32..1_000_000,
        overscan in 0usize..20
    ) {
        let content = row_count as u64 * u64::from(row_height);
        // the grid cannot scroll past its last full viewport
        let reachable = u64::from(scroll).min(content.saturating_sub(u64::from(viewport)));
        let top_row = (reachable / u64::from(row_height)) as usize;

        let range = visible_range(row_count, row_height, viewport, scroll, overscan);
        prop_assert!(range.contains(&top_row));
        prop_assert!(range.start + overscan >= top_row);
    }
}
