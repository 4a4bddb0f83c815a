//! Clipped window and core rectangles around a seed pixel.
//!
//! All rectangles are half-open `[y_min, y_max) x [x_min, x_max)` in the
//! coordinate space they were built in. Near the image border the
//! rectangle is simply cut off; nothing is padded.

use ndarray::{s, ArrayView2, ArrayView3, ArrayViewMut2};

/// Axis-aligned half-open rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub y_min: usize,
    pub y_max: usize,
    pub x_min: usize,
    pub x_max: usize,
}

impl Bounds {
    /// Square of side `2 * radius + 1` centered on `(y, x)`, clipped to
    /// an image of `(height, width)`.
    ///
    /// `(y, x)` must lie inside the image, which makes the result at
    /// least 1x1.
    pub fn around(center: (usize, usize), radius: usize, shape: (usize, usize)) -> Self {
        let (y, x) = center;
        let (height, width) = shape;
        debug_assert!(y < height && x < width, "center {center:?} outside {shape:?}");

        Self {
            y_min: y.saturating_sub(radius),
            y_max: (y + radius + 1).min(height),
            x_min: x.saturating_sub(radius),
            x_max: (x + radius + 1).min(width),
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.y_max - self.y_min
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// True if `inner` lies entirely within `self`.
    pub fn contains(&self, inner: &Bounds) -> bool {
        inner.y_min >= self.y_min
            && inner.y_max <= self.y_max
            && inner.x_min >= self.x_min
            && inner.x_max <= self.x_max
    }

    /// Re-express `self` in the local coordinates of `outer`.
    ///
    /// This is the only place image-global coordinates are converted to
    /// window-local ones. Returns `None` if `self` is not inside `outer`.
    pub fn relative_to(&self, outer: &Bounds) -> Option<Bounds> {
        if !outer.contains(self) {
            return None;
        }
        Some(Bounds {
            y_min: self.y_min - outer.y_min,
            y_max: self.y_max - outer.y_min,
            x_min: self.x_min - outer.x_min,
            x_max: self.x_max - outer.x_min,
        })
    }

    /// View of the pixels covered by this rectangle.
    pub fn view_image<'a>(&self, image: &'a ArrayView3<'_, u8>) -> ArrayView3<'a, u8> {
        image.slice(s![self.y_min..self.y_max, self.x_min..self.x_max, ..])
    }

    pub fn view_mask<'a>(&self, mask: &'a ArrayView2<'_, u8>) -> ArrayView2<'a, u8> {
        mask.slice(s![self.y_min..self.y_max, self.x_min..self.x_max])
    }

    pub fn view_mask_mut<'a>(&self, mask: &'a mut ArrayViewMut2<'_, u8>) -> ArrayViewMut2<'a, u8> {
        mask.slice_mut(s![self.y_min..self.y_max, self.x_min..self.x_max])
    }
}

/// Analysis window and core region for one seed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedGeometry {
    pub seed: (usize, usize),
    /// Window in image coordinates.
    pub window: Bounds,
    /// Core region in image coordinates.
    pub core: Bounds,
    /// Core region in window-local coordinates.
    pub core_local: Bounds,
}

impl SeedGeometry {
    /// Both rectangles for `seed`. Requires `core_radius <= window_radius`.
    pub fn new(
        seed: (usize, usize),
        window_radius: usize,
        core_radius: usize,
        shape: (usize, usize),
    ) -> Self {
        let window = Bounds::around(seed, window_radius, shape);
        let core = Bounds::around(seed, core_radius.min(window_radius), shape);
        // A core built from a smaller radius around the same center is
        // always inside the window, clipped or not.
        let core_local = core.relative_to(&window).unwrap_or(Bounds {
            y_min: 0,
            y_max: 0,
            x_min: 0,
            x_max: 0,
        });

        Self {
            seed,
            window,
            core,
            core_local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_window_is_full_size() {
        let b = Bounds::around((10, 10), 3, (30, 30));
        assert_eq!(b, Bounds { y_min: 7, y_max: 14, x_min: 7, x_max: 14 });
        assert_eq!(b.shape(), (7, 7));
    }

    #[test]
    fn test_corner_window_is_clipped() {
        let b = Bounds::around((0, 0), 5, (20, 20));
        assert_eq!(b, Bounds { y_min: 0, y_max: 6, x_min: 0, x_max: 6 });

        let b = Bounds::around((19, 19), 5, (20, 20));
        assert_eq!(b, Bounds { y_min: 14, y_max: 20, x_min: 14, x_max: 20 });
    }

    #[test]
    fn test_radius_larger_than_image() {
        let b = Bounds::around((1, 2), 50, (3, 4));
        assert_eq!(b, Bounds { y_min: 0, y_max: 3, x_min: 0, x_max: 4 });
    }

    #[test]
    fn test_zero_radius_is_single_pixel() {
        let b = Bounds::around((4, 7), 0, (10, 10));
        assert_eq!(b.shape(), (1, 1));
        assert!(!b.is_empty());
    }

    #[test]
    fn test_relative_to_at_clipped_edge() {
        // Seed at the left edge: window is clipped, core is not shifted.
        let geom = SeedGeometry::new((10, 1), 6, 2, (40, 40));
        assert_eq!(geom.window, Bounds { y_min: 4, y_max: 17, x_min: 0, x_max: 8 });
        assert_eq!(geom.core, Bounds { y_min: 8, y_max: 13, x_min: 0, x_max: 4 });
        assert_eq!(geom.core_local, Bounds { y_min: 4, y_max: 9, x_min: 0, x_max: 4 });
        assert!(geom.window.contains(&geom.core));
    }

    #[test]
    fn test_relative_to_rejects_outside() {
        let outer = Bounds { y_min: 2, y_max: 5, x_min: 2, x_max: 5 };
        let inner = Bounds { y_min: 1, y_max: 3, x_min: 2, x_max: 4 };
        assert!(inner.relative_to(&outer).is_none());
    }

    #[test]
    fn test_core_always_inside_window() {
        let shape = (7, 9);
        for y in 0..shape.0 {
            for x in 0..shape.1 {
                let geom = SeedGeometry::new((y, x), 3, 2, shape);
                assert!(geom.window.contains(&geom.core));
                assert!(geom.window.y_max <= shape.0 && geom.window.x_max <= shape.1);
                assert_eq!(geom.core_local.shape(), geom.core.shape());
            }
        }
    }
}
