//! Property-based invariant tests for tile partitioning.
//!
//! 1. Every pixel of `[0,width) × [0,height)` lies in exactly one tile.
//! 2. No tile extends past the image or is empty.
//! 3. Tile count is `ceil(W/TS) * ceil(H/TS)`.
//! 4. Summed tile areas equal the image area.

use nebula_core::geometry::{Tile, TileGrid, tile_size_for_chunk};
use proptest::prelude::*;

fn grid_strategy() -> impl Strategy<Value = (u32, u32, u32)> {
    (0u32..=200, 0u32..=200, 1u32..=80)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Exact cover, zero overlap
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tiles_cover_every_pixel_once((w, h, ts) in grid_strategy()) {
        let grid = TileGrid::new(w, h, ts);
        let mut hits = vec![0u8; (w * h) as usize];
        for tile in grid.iter() {
            for y in tile.y0..tile.y1 {
                for x in tile.x0..tile.x1 {
                    hits[(y * w + x) as usize] += 1;
                }
            }
        }
        prop_assert!(hits.iter().all(|&n| n == 1), "cover failed for {}x{} ts={}", w, h, ts);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Tiles stay inside the image and are never empty
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tiles_are_in_bounds_and_non_empty((w, h, ts) in grid_strategy()) {
        for tile in TileGrid::new(w, h, ts).iter() {
            prop_assert!(!tile.is_empty(), "empty tile {:?}", tile);
            prop_assert!(tile.x1 <= w && tile.y1 <= h, "{:?} outside {}x{}", tile, w, h);
            prop_assert!(tile.width() <= ts && tile.height() <= ts);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3 & 4. Counts and areas
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tile_count_and_area_match((w, h, ts) in grid_strategy()) {
        let grid = TileGrid::new(w, h, ts);
        let tiles: Vec<Tile> = grid.iter().collect();
        prop_assert_eq!(tiles.len(), (w.div_ceil(ts) * h.div_ceil(ts)) as usize);
        prop_assert_eq!(tiles.len(), grid.len());
        let area: u64 = tiles.iter().map(Tile::area).sum();
        prop_assert_eq!(area, u64::from(w) * u64::from(h));
    }
}

proptest! {
    #[test]
    fn chunk_maps_into_tile_range(chunk in 1u32..=512) {
        let ts = tile_size_for_chunk(chunk);
        prop_assert!((8..=64).contains(&ts));
    }
}
