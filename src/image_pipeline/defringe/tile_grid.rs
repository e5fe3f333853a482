//! Partition of an image into overlapping fixed-size tiles

pub const TILE_SIZE: usize = 128;
pub const TILE_OVERLAP: usize = 16;

/// Tiling along one axis. Interior tiles step by `tile - overlap`; whatever
/// doesn't fit is split into a left and right excess, each covered by one
/// extra full-size tile anchored at the axis edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAxis {
    axis: usize,
    tile: usize,
    overlap: usize,
    interior: usize,
    excess_left: usize,
    excess_right: usize,
}

impl TileAxis {
    pub fn new(axis: usize, tile: usize, overlap: usize) -> Self {
        assert!(tile > overlap, "tile size must exceed overlap");
        if axis < tile {
            // One short tile spanning the whole axis.
            return Self {
                axis,
                tile: axis,
                overlap: 0,
                interior: 1,
                excess_left: 0,
                excess_right: 0,
            };
        }
        let interior = (axis - overlap) / (tile - overlap);
        let covered = interior * tile - (interior - 1) * overlap;
        let excess = axis - covered;
        let excess_right = excess / 2;
        let excess_left = excess - excess_right;
        Self {
            axis,
            tile,
            overlap,
            interior,
            excess_left,
            excess_right,
        }
    }

    pub fn count(&self) -> usize {
        self.interior + usize::from(self.excess_left > 0) + usize::from(self.excess_right > 0)
    }

    pub fn tile_len(&self) -> usize {
        self.tile
    }

    pub fn offset(&self, idx: usize) -> usize {
        let has_left = self.excess_left > 0;
        let has_right = self.excess_right > 0;
        if has_left && idx == 0 {
            return 0;
        }
        if has_right && idx + 1 == self.count() {
            return self.axis - self.tile;
        }
        let interior_idx = if has_left { idx - 1 } else { idx };
        self.excess_left + (self.tile - self.overlap) * interior_idx
    }

    /// Tile centre as a fraction of the axis length.
    pub fn normalized_center(&self, idx: usize) -> f64 {
        (self.offset(idx) as f64 + self.tile as f64 / 2.0) / self.axis as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub center: (f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub x: TileAxis,
    pub y: TileAxis,
}

impl TileGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            x: TileAxis::new(width, TILE_SIZE, TILE_OVERLAP),
            y: TileAxis::new(height, TILE_SIZE, TILE_OVERLAP),
        }
    }

    pub fn len(&self) -> usize {
        self.x.count() * self.y.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        (0..self.y.count()).flat_map(move |ty| {
            (0..self.x.count()).map(move |tx| Tile {
                x: self.x.offset(tx),
                y: self.y.offset(ty),
                width: self.x.tile_len(),
                height: self.y.tile_len(),
                center: (self.x.normalized_center(tx), self.y.normalized_center(ty)),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(axis: &TileAxis, len: usize) {
        let mut covered = vec![false; len];
        for i in 0..axis.count() {
            let off = axis.offset(i);
            assert!(off + axis.tile_len() <= len, "tile {i} overruns axis");
            for c in &mut covered[off..off + axis.tile_len()] {
                *c = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn test_exact_fit_has_no_excess_tiles() {
        // 3 interior tiles: 3*128 - 2*16 = 352
        let axis = TileAxis::new(352, TILE_SIZE, TILE_OVERLAP);
        assert_eq!(axis.count(), 3);
        assert_eq!(axis.offset(0), 0);
        assert_eq!(axis.offset(1), 112);
        assert_eq!(axis.offset(2), 224);
        assert_covers(&axis, 352);
    }

    #[test]
    fn test_excess_tiles_are_anchored_at_edges() {
        let axis = TileAxis::new(400, TILE_SIZE, TILE_OVERLAP);
        // 3 interior tiles cover 352, excess 48 -> 24 left, 24 right
        assert_eq!(axis.count(), 5);
        assert_eq!(axis.offset(0), 0);
        assert_eq!(axis.offset(1), 24);
        assert_eq!(axis.offset(4), 400 - 128);
        assert_covers(&axis, 400);

        let odd = TileAxis::new(353, TILE_SIZE, TILE_OVERLAP);
        // excess 1 goes to the left
        assert_eq!(odd.count(), 4);
        assert_eq!(odd.offset(1), 1);
        assert_covers(&odd, 353);
    }

    #[test]
    fn test_short_axis_gets_single_tile() {
        let axis = TileAxis::new(40, TILE_SIZE, TILE_OVERLAP);
        assert_eq!(axis.count(), 1);
        assert_eq!(axis.tile_len(), 40);
        assert_eq!(axis.offset(0), 0);
        assert!((axis.normalized_center(0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tiny_axes_get_single_tile() {
        for len in [2, 5, 15] {
            let axis = TileAxis::new(len, TILE_SIZE, TILE_OVERLAP);
            assert_eq!(axis.count(), 1);
            assert_eq!(axis.offset(0), 0);
            assert_covers(&axis, len);
        }
        let tiles: Vec<Tile> = TileGrid::new(2, 5).tiles().collect();
        assert_eq!(tiles.len(), 1);
        assert_eq!((tiles[0].width, tiles[0].height), (2, 5));
        assert_eq!(tiles[0].center, (0.5, 0.5));
    }

    #[test]
    fn test_grid_centres_are_normalised() {
        let grid = TileGrid::new(640, 480);
        assert_eq!(grid.tiles().count(), grid.len());
        for tile in grid.tiles() {
            assert!(tile.center.0 > 0.0 && tile.center.0 < 1.0);
            assert!(tile.center.1 > 0.0 && tile.center.1 < 1.0);
            assert!(tile.x + tile.width <= 640);
            assert!(tile.y + tile.height <= 480);
        }
    }
}
