//! Pointer projection from window pixels to normalized device coordinates

use cgmath::Vector2;

/// Drawable area in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, `None` for a minimised window
    pub fn aspect(&self) -> Option<f32> {
        (!self.is_empty()).then(|| self.width as f32 / self.height as f32)
    }
}

/// Last known pointer position in NDC
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    /// Far outside [-1, 1]: no ray through it hits anything on screen
    pub const OFF_SCREEN: PointerState = PointerState {
        x: -1000.0,
        y: -1000.0,
    };

    /// Maps a window position to NDC: x grows right, y grows up.
    ///
    /// A zero-area viewport yields [`PointerState::OFF_SCREEN`].
    pub fn project(client_x: f64, client_y: f64, viewport: Viewport) -> Self {
        if viewport.is_empty() {
            return Self::OFF_SCREEN;
        }
        Self {
            x: ((client_x / viewport.width as f64) * 2.0 - 1.0) as f32,
            y: (-(client_y / viewport.height as f64) * 2.0 + 1.0) as f32,
        }
    }

    /// Projects and stores a new position. Last write wins.
    pub fn update(&mut self, client_x: f64, client_y: f64, viewport: Viewport) {
        *self = Self::project(client_x, client_y, viewport);
    }

    pub fn is_off_screen(&self) -> bool {
        *self == Self::OFF_SCREEN
    }

    pub fn ndc(&self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::OFF_SCREEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn starts_off_screen() {
        assert!(PointerState::default().is_off_screen());
    }

    #[test]
    fn corners_and_centre() {
        assert_eq!(
            PointerState::project(0.0, 0.0, VIEWPORT),
            PointerState { x: -1.0, y: 1.0 }
        );
        assert_eq!(
            PointerState::project(800.0, 600.0, VIEWPORT),
            PointerState { x: 1.0, y: -1.0 }
        );
        assert_eq!(
            PointerState::project(400.0, 300.0, VIEWPORT),
            PointerState { x: 0.0, y: 0.0 }
        );
    }

    #[test]
    fn inside_viewport_stays_in_range() {
        for (px, py) in [(1.0, 599.0), (123.0, 45.0), (799.0, 1.0)] {
            let p = PointerState::project(px, py, VIEWPORT);
            assert!((-1.0..=1.0).contains(&p.x));
            assert!((-1.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn repeated_updates_are_idempotent() {
        let mut pointer = PointerState::default();
        pointer.update(200.0, 150.0, VIEWPORT);
        let first = pointer;
        pointer.update(200.0, 150.0, VIEWPORT);
        assert_eq!(first, pointer);
        assert_eq!(pointer, PointerState { x: -0.5, y: 0.5 });
    }

    #[test]
    fn empty_viewport_goes_off_screen() {
        let p = PointerState::project(10.0, 10.0, Viewport::new(0, 600));
        assert!(p.is_off_screen());
        assert_eq!(Viewport::new(800, 0).aspect(), None);
    }
}
