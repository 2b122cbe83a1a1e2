//! Rays, planes and the camera model used to turn screen positions into
//! world-space rays.

use glam::{Mat4, Vec2, Vec3};
use mochi_config::CameraFraming;

use crate::mesh::Aabb;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// An infinite plane through `point`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Where the ray crosses the plane, if it does so in front of its origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Vec3> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < EPSILON {
            return None;
        }
        let t = self.normal.dot(self.point - ray.origin) / denom;
        (t >= 0.0).then(|| ray.at(t))
    }
}

/// Map a pixel position to normalized device coordinates.
///
/// `(0, 0)` is the top-left pixel and maps to `(-1, 1)`; y grows downward on
/// screen and upward in NDC.
pub fn normalize_screen(position: Vec2, viewport: Vec2) -> Vec2 {
    let size = viewport.max(Vec2::ONE);
    Vec2::new(
        position.x / size.x * 2.0 - 1.0,
        (size.y - position.y) / size.y * 2.0 - 1.0,
    )
}

/// Anything that can turn a normalized screen position into a world ray.
pub trait ScreenRay {
    fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray>;
}

/// Right-handed perspective camera looking at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveView {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveView {
    /// Camera on the +Z axis looking at the origin, pulled back far enough
    /// that the framed extent fits in front of the mesh.
    pub fn framed(aspect: f32, bounds: &Aabb, framing: &CameraFraming) -> Self {
        let aspect = aspect.max(EPSILON);
        Self {
            position: Vec3::new(0.0, 0.0, framing.camera_distance(aspect, bounds.max.z)),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: framing.fov_radians(),
            aspect,
            near: framing.near,
            far: framing.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl ScreenRay for PerspectiveView {
    fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let inverse = self.view_projection().inverse();
        // Depth 0 is the near plane with this projection
        let near_point = inverse.project_point3(ndc.extend(0.0));
        let direction = near_point - self.position;
        if !direction.is_finite() || direction.length_squared() < EPSILON * EPSILON {
            return None;
        }
        Some(Ray::new(self.position, direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_screen_corners() {
        let viewport = Vec2::new(200.0, 100.0);
        assert_eq!(normalize_screen(Vec2::ZERO, viewport), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_screen(viewport, viewport), Vec2::new(1.0, -1.0));
        assert_eq!(
            normalize_screen(Vec2::new(100.0, 50.0), viewport),
            Vec2::ZERO
        );
    }

    #[test]
    fn test_plane_intersection() {
        let plane = Plane::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        let ray = Ray::new(Vec3::new(1.0, 1.0, 10.0), Vec3::NEG_Z);
        let hit = plane.intersect_ray(&ray).unwrap();
        assert!((hit - Vec3::new(1.0, 1.0, 2.0)).length() < 1e-6);

        // Parallel and behind
        assert!(plane.intersect_ray(&Ray::new(Vec3::ZERO, Vec3::X)).is_none());
        assert!(plane.intersect_ray(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).is_none());
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let bounds = Aabb {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        };
        let view = PerspectiveView::framed(1.5, &bounds, &CameraFraming::default());
        let ray = view.ray_from_ndc(Vec2::ZERO).unwrap();
        assert_eq!(ray.origin, view.position);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_edge_ray_matches_field_of_view() {
        let bounds = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        };
        let framing = CameraFraming::default();
        let view = PerspectiveView::framed(2.0, &bounds, &framing);

        // The top edge of the screen sees min_y_ratio units above the
        // origin at the framed depth
        let ray = view.ray_from_ndc(Vec2::new(0.0, 1.0)).unwrap();
        let at_origin = Plane::new(Vec3::ZERO, Vec3::Z).intersect_ray(&ray).unwrap();
        assert!((at_origin.y - framing.min_y_ratio).abs() < 1e-3);
        assert!(at_origin.x.abs() < 1e-4);
    }
}
