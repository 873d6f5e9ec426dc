//! Grid geometry: source rectangles for tiles and pointer-to-slot mapping.
//!
//! Source rectangles live in image pixel space. Widths and heights are
//! rounded up while origins are rounded down, so on sizes that do not divide
//! evenly the last row/column overscans by a pixel instead of leaving a gap.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Rectangle in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct SourceRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Largest column or row count a grid may have.
pub const MAX_GRID_DIMENSION: u32 = 64;

/// Grid shape of a level: columns × rows, each in `1..=MAX_GRID_DIMENSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawGridShape")]
pub struct GridShape {
    columns: u32,
    rows: u32,
}

#[derive(Deserialize)]
struct RawGridShape {
    columns: u32,
    rows: u32,
}

impl From<RawGridShape> for GridShape {
    fn from(raw: RawGridShape) -> Self {
        GridShape::new(raw.columns, raw.rows)
    }
}

impl GridShape {
    /// Creates a grid shape, clamping each dimension to `1..=MAX_GRID_DIMENSION`.
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: columns.clamp(1, MAX_GRID_DIMENSION),
            rows: rows.clamp(1, MAX_GRID_DIMENSION),
        }
    }

    /// Shrinks the shape so every displayed tile is at least one pixel on a
    /// `width` × `height` canvas.
    pub fn fit_to(self, width: u32, height: u32) -> Self {
        Self::new(self.columns.min(width), self.rows.min(height))
    }

    /// Number of columns.
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile count and slot-space size (N).
    pub fn slot_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Row-major slot index for a column/row pair.
    pub fn slot_of(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    /// Column/row pair for a slot index.
    pub fn position_of(&self, slot: usize) -> Option<(u32, u32)> {
        if slot >= self.slot_count() {
            return None;
        }
        let columns = self.columns as usize;
        Some(((slot % columns) as u32, (slot / columns) as u32))
    }
}

impl std::fmt::Display for GridShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.columns, self.rows)
    }
}

/// Computes the source rectangle of every tile, in row-major slot order.
#[instrument]
pub fn partition(image_width: u32, image_height: u32, shape: GridShape) -> Vec<SourceRect> {
    let columns = u64::from(shape.columns());
    let rows = u64::from(shape.rows());
    let width = u64::from(image_width);
    let height = u64::from(image_height);

    let tile_width = width.div_ceil(columns) as u32;
    let tile_height = height.div_ceil(rows) as u32;

    let mut rects = Vec::with_capacity(shape.slot_count());
    for row in 0..rows {
        for column in 0..columns {
            // floor(col * W / cols) without going through floats
            let x = (column * width / columns) as u32;
            let y = (row * height / rows) as u32;
            rects.push(SourceRect::new(x, y, tile_width, tile_height));
        }
    }
    rects
}

/// Display-space grid drawn on the canvas.
///
/// Display tiles use the floored canvas/cols size, so a few pixels on the
/// right and bottom edges may lie outside every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayGrid {
    canvas_width: u32,
    canvas_height: u32,
    shape: GridShape,
}

impl DisplayGrid {
    /// Creates a display grid for the given canvas and shape.
    pub fn new(canvas_width: u32, canvas_height: u32, shape: GridShape) -> Self {
        Self {
            canvas_width,
            canvas_height,
            shape,
        }
    }

    /// Grid shape.
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Width of one displayed tile.
    pub fn tile_width(&self) -> u32 {
        self.canvas_width / self.shape.columns()
    }

    /// Height of one displayed tile.
    pub fn tile_height(&self) -> u32 {
        self.canvas_height / self.shape.rows()
    }

    /// Canvas-space origin of a slot.
    pub fn cell_origin(&self, slot: usize) -> Option<(u32, u32)> {
        let (column, row) = self.shape.position_of(slot)?;
        Some((column * self.tile_width(), row * self.tile_height()))
    }

    /// Resolves pointer coordinates to a slot.
    ///
    /// Returns `None` outside the canvas, and for the sliver past the last
    /// full tile when the canvas does not divide evenly.
    #[instrument(skip(self), fields(shape = %self.shape))]
    pub fn slot_at(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if x < 0.0 || y < 0.0 || x > f64::from(self.canvas_width) || y > f64::from(self.canvas_height) {
            return None;
        }
        let tile_width = self.tile_width();
        let tile_height = self.tile_height();
        if tile_width == 0 || tile_height == 0 {
            return None;
        }
        let column = (x / f64::from(tile_width)).floor() as u32;
        let row = (y / f64::from(tile_height)).floor() as u32;
        self.shape.slot_of(column, row)
    }
}
