//! Exact hex geometry for the 19-tile cosmic board.
//!
//! Tiles are pointy-top hexes laid out in rows of 3-4-5-4-3. Instead of
//! merging floating point corners that land "close enough" to each other,
//! every corner is expressed on an integer lattice:
//! - `x` counts half hex widths (`sqrt(3) * size / 2` pixels)
//! - `y` counts quarter hex heights (`size / 2` pixels)
//!
//! Two corners of neighbouring tiles are the same vertex exactly when their
//! lattice points are equal, so deduplication is a plain map lookup. Pixel
//! positions are only derived at the end, for ids and rendering.

use serde::{Deserialize, Serialize};

/// Hex radius in pixels (centre to corner)
pub const HEX_SIZE: f64 = 70.0;

/// Number of tiles in each board row, top to bottom
pub const ROW_SIZES: [u8; 5] = [3, 4, 5, 4, 3];

/// Number of tiles on a standard board
pub const TILE_COUNT: usize = 19;

/// Width of the widest row, in tiles
const MAX_ROW: i32 = 5;

/// Corner of a pointy-top hex, clockwise from the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    Top,
    TopRight,
    BottomRight,
    Bottom,
    BottomLeft,
    TopLeft,
}

impl Corner {
    /// All corners in clockwise order starting from the top
    pub const ALL: [Corner; 6] = [
        Corner::Top,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::Bottom,
        Corner::BottomLeft,
        Corner::TopLeft,
    ];

    /// Offset of this corner from the tile's bounding-box origin
    fn offset(self) -> (i32, i32) {
        match self {
            Corner::Top => (1, 0),
            Corner::TopRight => (2, 1),
            Corner::BottomRight => (2, 3),
            Corner::Bottom => (1, 4),
            Corner::BottomLeft => (0, 3),
            Corner::TopLeft => (0, 1),
        }
    }

    /// The next corner going clockwise
    pub fn next(self) -> Corner {
        match self {
            Corner::Top => Corner::TopRight,
            Corner::TopRight => Corner::BottomRight,
            Corner::BottomRight => Corner::Bottom,
            Corner::Bottom => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopLeft,
            Corner::TopLeft => Corner::Top,
        }
    }
}

/// Row/column position of a tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub row: u8,
    pub col: u8,
}

impl GridPos {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Every grid position of the standard board in row-major order
    pub fn all() -> Vec<GridPos> {
        let mut positions = Vec::with_capacity(TILE_COUNT);
        for (row, &size) in ROW_SIZES.iter().enumerate() {
            for col in 0..size {
                positions.push(GridPos::new(row as u8, col));
            }
        }
        positions
    }

    /// Whether this position lies on the 3-4-5-4-3 layout
    pub fn is_valid(&self) -> bool {
        ROW_SIZES
            .get(self.row as usize)
            .is_some_and(|&size| self.col < size)
    }

    /// Lattice origin (top-left of the bounding box) of this tile.
    ///
    /// Rows are centred, so a row of `k` tiles is shifted right by
    /// `5 - k` half widths; consecutive rows sit three quarter heights apart.
    fn origin(&self) -> LatticePoint {
        let size = ROW_SIZES.get(self.row as usize).copied().unwrap_or(0) as i32;
        LatticePoint {
            x: (MAX_ROW - size) + 2 * self.col as i32,
            y: 3 * self.row as i32,
        }
    }

    /// Lattice point of one corner of this tile
    pub fn corner(&self, corner: Corner) -> LatticePoint {
        let origin = self.origin();
        let (dx, dy) = corner.offset();
        LatticePoint {
            x: origin.x + dx,
            y: origin.y + dy,
        }
    }

    /// All six corners in clockwise order starting from the top
    pub fn corners(&self) -> [LatticePoint; 6] {
        Corner::ALL.map(|c| self.corner(c))
    }

    /// The six sides as corner pairs, clockwise
    pub fn sides(&self) -> [(LatticePoint, LatticePoint); 6] {
        Corner::ALL.map(|c| (self.corner(c), self.corner(c.next())))
    }

    /// Pixel centre of the tile
    pub fn center(&self) -> Point {
        let origin = self.origin();
        Point::from_lattice(origin.x + 1, origin.y + 2)
    }
}

/// A corner position on the integer lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LatticePoint {
    /// Half hex widths from the left edge of the widest row
    pub x: i32,
    /// Quarter hex heights from the top of the first row
    pub y: i32,
}

impl LatticePoint {
    /// Pixel position of this lattice point
    pub fn to_point(self) -> Point {
        Point::from_lattice(self.x, self.y)
    }

    /// Key for the side joining two corners.
    ///
    /// This is the midpoint in doubled lattice units, which keeps it integral
    /// and identical no matter which tile (or direction) the side is read from.
    pub fn side_key(a: LatticePoint, b: LatticePoint) -> LatticePoint {
        LatticePoint {
            x: a.x + b.x,
            y: a.y + b.y,
        }
    }
}

/// A pixel position, used for ids and rendering
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Horizontal pixels per lattice step
    pub fn half_width() -> f64 {
        3f64.sqrt() * HEX_SIZE / 2.0
    }

    /// Vertical pixels per lattice step
    pub fn quarter_height() -> f64 {
        HEX_SIZE / 2.0
    }

    fn from_lattice(x: i32, y: i32) -> Self {
        Self {
            x: x as f64 * Self::half_width(),
            y: y as f64 * Self::quarter_height(),
        }
    }

    /// Midpoint between two points
    pub fn midpoint(a: Point, b: Point) -> Point {
        Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }

    /// Rounded pixel coordinates, used to build string ids
    pub fn rounded(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}
