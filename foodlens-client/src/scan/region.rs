//! Viewfinder geometry

/// Default side of the square viewfinder, in screen points
pub const DEFAULT_ROI_SIDE: f64 = 280.0;

/// Bounding box reported by the barcode decoder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ReadBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Square region centered in the camera preview
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    left: f64,
    top: f64,
    side: f64,
}

impl RegionOfInterest {
    pub fn centered(viewport_width: f64, viewport_height: f64, side: f64) -> Self {
        Self {
            left: (viewport_width - side) / 2.0,
            top: (viewport_height - side) / 2.0,
            side,
        }
    }

    /// Whether the center of `bounds` lies inside the region (edges inclusive)
    pub fn contains(&self, bounds: &ReadBounds) -> bool {
        let (cx, cy) = bounds.center();
        let right = self.left + self.side;
        let bottom = self.top + self.side;
        cx >= self.left && cx <= right && cy >= self.top && cy <= bottom
    }
}
