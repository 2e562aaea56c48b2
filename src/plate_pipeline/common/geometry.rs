//! Pixel coordinates and axis-aligned boxes in plate space.

/// Pixel coordinate `(x, y)`.
pub type PixelPos = (u32, u32);

/// Axis-aligned bounding box. `width`/`height` are inclusive pixel extents,
/// so a single pixel has a 1×1 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_pixel((x, y): PixelPos) -> Self {
        Self::new(x, y, 1, 1)
    }

    /// Grows the box to contain `(x, y)`.
    pub fn include(&mut self, (x, y): PixelPos) {
        let right = self.right().max(x + 1);
        let bottom = self.bottom().max(y + 1);
        self.x = self.x.min(x);
        self.y = self.y.min(y);
        self.width = right - self.x;
        self.height = bottom - self.y;
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn contains(&self, (x, y): PixelPos) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Bounding box of a non-empty pixel list.
    pub fn enclosing(pixels: &[PixelPos]) -> Option<Self> {
        let (first, rest) = pixels.split_first()?;
        let mut bbox = Self::from_pixel(*first);
        for &p in rest {
            bbox.include(p);
        }
        Some(bbox)
    }

    pub fn to_rect(&self) -> imageproc::rect::Rect {
        imageproc::rect::Rect::at(self.x as i32, self.y as i32)
            .of_size(self.width.max(1), self.height.max(1))
    }
}
