#![forbid(unsafe_code)]

//! Tile geometry.
//!
//! A frame is cut into square tiles that are computed independently. Tiles
//! of one grid never overlap and their union is exactly the image, including
//! the clipped tiles on the right and bottom edges.

/// Smallest tile edge, in pixels.
pub const MIN_TILE_SIZE: u32 = 8;

/// Largest tile edge, in pixels.
pub const MAX_TILE_SIZE: u32 = 64;

/// Map the configured work chunk onto a cache-friendly tile edge.
#[inline]
pub const fn tile_size_for_chunk(chunk: u32) -> u32 {
    if chunk < MIN_TILE_SIZE {
        MIN_TILE_SIZE
    } else if chunk > MAX_TILE_SIZE {
        MAX_TILE_SIZE
    } else {
        chunk
    }
}

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tile {
    /// Left edge (inclusive).
    pub x0: u32,
    /// Top edge (inclusive).
    pub y0: u32,
    /// Right edge (exclusive).
    pub x1: u32,
    /// Bottom edge (exclusive).
    pub y1: u32,
}

impl Tile {
    #[inline]
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// Pixel count.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Row-major partition of a `width × height` grid into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: u32,
}

impl TileGrid {
    #[inline]
    pub const fn new(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_size,
        }
    }

    #[inline]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Tiles per row.
    #[inline]
    pub const fn columns(&self) -> u32 {
        if self.tile_size == 0 {
            0
        } else {
            self.width.div_ceil(self.tile_size)
        }
    }

    /// Tile rows.
    #[inline]
    pub const fn rows(&self) -> u32 {
        if self.tile_size == 0 {
            0
        } else {
            self.height.div_ceil(self.tile_size)
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile at grid position `(tx, ty)`, clipped to the image.
    #[inline]
    pub fn tile(&self, tx: u32, ty: u32) -> Tile {
        let x0 = tx * self.tile_size;
        let y0 = ty * self.tile_size;
        Tile::new(
            x0,
            y0,
            x0.saturating_add(self.tile_size).min(self.width),
            y0.saturating_add(self.tile_size).min(self.height),
        )
    }

    /// Iterate tiles row-major: `ty` outer, `tx` inner.
    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        let columns = self.columns();
        (0..self.rows()).flat_map(move |ty| (0..columns).map(move |tx| self.tile(tx, ty)))
    }
}
