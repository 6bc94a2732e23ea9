//! ViewTransform: the pan and zoom mapping between screen and world space.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Board view state.
///
/// `screen = world * scale + offset`. The device pixel ratio is not part of
/// this transform; it is applied by the renderer when rasterizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World-to-screen translation in screen pixels.
    pub offset: Vec2,
    /// Current zoom level.
    pub scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: 0.2,
            max_scale: 5.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom limits.
    pub fn with_limits(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            ..Self::default()
        }
    }

    /// World to screen, in CSS pixels.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen to world.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.offset.x) / self.scale,
            (screen_point.y - self.offset.y) / self.scale,
        )
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            world_point.x * self.scale + self.offset.x,
            world_point.y * self.scale + self.offset.y,
        )
    }

    /// Convert a screen-pixel length to world units at the current scale.
    pub fn px_to_world(&self, px: f64) -> f64 {
        px / self.scale
    }

    /// Shift the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set the scale (clamped) and solve the offset so `world_point` lands
    /// on `screen_point`.
    pub fn set_scale_anchored(&mut self, scale: f64, world_point: Point, screen_point: Point) {
        self.scale = scale.clamp(self.min_scale, self.max_scale);
        self.offset = Vec2::new(
            screen_point.x - world_point.x * self.scale,
            screen_point.y - world_point.y * self.scale,
        );
    }

    /// Zoom by `factor`, keeping the world point under `screen_point` fixed.
    ///
    /// Returns whether the scale changed.
    pub fn zoom_at_screen_point(&mut self, screen_point: Point, factor: f64) -> bool {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }
        let world_point = self.screen_to_world(screen_point);
        self.set_scale_anchored(new_scale, world_point, screen_point);
        true
    }

    /// Back to the origin at 100%. Limits are kept.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }
}

/// Two-finger zoom captured at gesture start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGesture {
    pub start_distance: f64,
    pub start_scale: f64,
    /// World point under the initial two-finger midpoint.
    pub world_mid: Point,
}

impl PinchGesture {
    pub fn begin(camera: &Camera, a: Point, b: Point) -> Self {
        Self {
            start_distance: a.distance(b).max(1.0),
            start_scale: camera.scale,
            world_mid: camera.screen_to_world(a.midpoint(b)),
        }
    }

    /// Apply the current finger positions: scale follows the distance ratio
    /// and the captured world point follows the current midpoint.
    pub fn update(&self, camera: &mut Camera, a: Point, b: Point) {
        let factor = a.distance(b) / self.start_distance;
        camera.set_scale_anchored(self.start_scale * factor, self.world_mid, a.midpoint(b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_offset_and_zoom() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(50.0, 100.0);
        camera.scale = 2.0;
        assert_close(camera.screen_to_world(Point::new(150.0, 300.0)), Point::new(50.0, 100.0));
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        camera.scale = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));
        assert_close(back, original);
    }

    #[test]
    fn test_transform_matches_point_mapping() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(7.0, 9.0);
        camera.scale = 0.5;
        let world = Point::new(40.0, -12.0);
        assert_close(camera.transform() * world, camera.world_to_screen(world));
        assert_close(camera.inverse_transform() * camera.world_to_screen(world), world);
    }

    #[test]
    fn test_zoom_keeps_fixed_point() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(-35.0, 12.0);
        camera.scale = 1.3;
        for (screen, factor) in [
            (Point::new(50.0, 50.0), 1.1),
            (Point::new(0.0, 640.0), 0.7),
            (Point::new(812.5, 3.25), 2.4),
        ] {
            let before = camera.screen_to_world(screen);
            camera.zoom_at_screen_point(screen, factor);
            assert_close(camera.screen_to_world(screen), before);
        }
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_at_screen_point(Point::ZERO, 0.001);
        assert!((camera.scale - 0.2).abs() < f64::EPSILON);

        camera.scale = 1.0;
        camera.zoom_at_screen_point(Point::ZERO, 1000.0);
        assert!((camera.scale - 5.0).abs() < f64::EPSILON);
        assert!(!camera.zoom_at_screen_point(Point::ZERO, 2.0));
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert_eq!(camera.offset, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_pinch_follows_midpoint() {
        let mut camera = Camera::new();
        let gesture = PinchGesture::begin(&camera, Point::new(100.0, 100.0), Point::new(200.0, 100.0));
        assert_close(gesture.world_mid, Point::new(150.0, 100.0));

        gesture.update(&mut camera, Point::new(50.0, 200.0), Point::new(250.0, 200.0));
        assert!((camera.scale - 2.0).abs() < 1e-9);
        assert_close(camera.world_to_screen(gesture.world_mid), Point::new(150.0, 200.0));
    }
}
