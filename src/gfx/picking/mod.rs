//! # Ray Geometry
//!
//! World-space rays, axis-aligned boxes and ray/triangle tests used by the
//! picking service in [`crate::interaction`].
//!
//! ## How a pick works
//!
//! 1. **Pointer to Ray**: unproject the pointer's NDC position through the
//!    inverse view-projection matrix at the near and far planes
//! 2. **Broad phase**: test the ray against each mesh's bounding box
//! 3. **Narrow phase**: Möller–Trumbore against the mesh triangles, keeping
//!    the barycentric coordinates to interpolate the surface UV

use cgmath::{ElementWise, InnerSpace, Matrix4, Vector2, Vector3, Vector4, Zero};

/// Rays shorter than this are treated as degenerate
const MIN_DIRECTION_LENGTH: f32 = 1e-12;
const TRIANGLE_EPSILON: f32 = 1e-7;
/// Barycentric slack so a ray along an edge shared by two triangles hits
/// at least one of them
const EDGE_TOLERANCE: f32 = 1e-4;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Builds a ray, or `None` when `direction` has (almost) no length
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Option<Self> {
        let length2 = direction.magnitude2();
        if !length2.is_finite() || length2 < MIN_DIRECTION_LENGTH {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / length2.sqrt(),
        })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Ray from a perspective camera's eye through the point under `ndc`
    pub fn from_eye(
        eye: Vector3<f32>,
        inverse_view_proj: &Matrix4<f32>,
        ndc: Vector2<f32>,
    ) -> Option<Self> {
        let far = unproject(inverse_view_proj, Vector4::new(ndc.x, ndc.y, 1.0, 1.0))?;
        Self::new(eye, far - eye)
    }

    /// The same ray expressed in another space, direction renormalised.
    ///
    /// Distances along the result are measured in the new space; map hit
    /// points back instead of scaling `t`.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Option<Self> {
        let origin = unproject(matrix, self.origin.extend(1.0))?;
        let direction = (matrix * self.direction.extend(0.0)).truncate();
        Self::new(origin, direction)
    }
}

fn unproject(matrix: &Matrix4<f32>, point: Vector4<f32>) -> Option<Vector3<f32>> {
    let p = matrix * point;
    if p.w.abs() < f32::EPSILON || !p.w.is_finite() {
        return None;
    }
    Some(p.truncate() / p.w)
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl AABB {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let mut min = Vector3::from(*first);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            min.x = min.x.min(vertex[0]);
            min.y = min.y.min(vertex[1]);
            min.z = min.z.min(vertex[2]);
            max.x = max.x.max(vertex[0]);
            max.y = max.y.max(vertex[1]);
            max.z = max.z.max(vertex[2]);
        }

        Self::new(min, max)
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &AABB) -> AABB {
        AABB::new(
            Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Test ray-AABB intersection (slab method).
    /// Returns the distance to the entry point, or to the exit point when the
    /// ray starts inside the box.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }
}

/// Where a ray crossed a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray
    pub t: f32,
    /// Barycentric weight of the second vertex
    pub u: f32,
    /// Barycentric weight of the third vertex
    pub v: f32,
}

impl TriangleHit {
    /// Interpolates a per-vertex attribute at the hit point
    pub fn interpolate(&self, a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> [f32; 2] {
        let w = 1.0 - self.u - self.v;
        [
            w * a[0] + self.u * b[0] + self.v * c[0],
            w * a[1] + self.u * b[1] + self.v * c[1],
        ]
    }
}

/// Möller–Trumbore ray/triangle intersection, both faces counted.
///
/// Edges and vertices belong to every triangle sharing them, within
/// [`EDGE_TOLERANCE`]. The reported weights are clamped back onto the
/// triangle.
pub fn intersect_triangle(
    ray: &Ray,
    a: Vector3<f32>,
    b: Vector3<f32>,
    c: Vector3<f32>,
) -> Option<TriangleHit> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < TRIANGLE_EPSILON {
        return None; // parallel or degenerate
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(-EDGE_TOLERANCE..=1.0 + EDGE_TOLERANCE).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < -EDGE_TOLERANCE || u + v > 1.0 + EDGE_TOLERANCE {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t < 0.0 {
        return None;
    }

    let (u, v) = (u.max(0.0), v.max(0.0));
    let sum = u + v;
    let (u, v) = if sum > 1.0 { (u / sum, v / sum) } else { (u, v) };
    Some(TriangleHit { t, u, v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, SquareMatrix};

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = AABB::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = AABB::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.5, 0.5, -5.0), Vector3::new(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.5, -5.0), Vector3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Ray::new(Vector3::zero(), Vector3::zero()).is_none());
    }

    #[test]
    fn triangle_hit_interpolates_uv() {
        let ray = Ray::new(Vector3::new(0.25, 0.5, 3.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let hit = intersect_triangle(
            &ray,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        )
        .unwrap();

        assert!((hit.t - 3.0).abs() < 1e-6);
        let uv = hit.interpolate([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]);
        assert!((uv[0] - 0.25).abs() < 1e-6);
        assert!((uv[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn triangle_behind_ray_is_missed() {
        let ray = Ray::new(Vector3::new(0.25, 0.25, -3.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let hit = intersect_triangle(
            &ray,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn eye_ray_through_the_centre_points_down_the_view_axis() {
        let eye = cgmath::Point3::new(0.0, 0.0, 5.0);
        let view = Matrix4::look_at_rh(eye, cgmath::Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
        let proj = cgmath::perspective(Deg(70.0), 1.5, 0.1, 100.0);
        let inverse = (proj * view).invert().unwrap();

        let ray = Ray::from_eye(Vector3::new(0.0, 0.0, 5.0), &inverse, Vector2::new(0.0, 0.0)).unwrap();
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-4);
        assert_eq!(ray.origin, Vector3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn transformed_ray_is_renormalised() {
        let ray = Ray::new(Vector3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let local = ray.transformed(&Matrix4::from_scale(0.5)).unwrap();
        assert!((local.origin.z - 5.0).abs() < 1e-6);
        assert!((local.direction.z + 1.0).abs() < 1e-6);
    }

    /// Unit quad split along the diagonal from (1, 0) to (0, 1)
    fn quad() -> [[Vector3<f32>; 3]; 2] {
        let (a, b, c, d) = (
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
        [[a, b, d], [b, c, d]]
    }

    fn quad_hits(ray: &Ray) -> Vec<TriangleHit> {
        quad()
            .iter()
            .filter_map(|[a, b, c]| intersect_triangle(ray, *a, *b, *c))
            .collect()
    }

    #[test]
    fn ray_on_the_shared_diagonal_hits_the_quad() {
        // Points on the diagonal, nudged by less than a float step off it
        for (x, y) in [(0.5, 0.5), (0.3, 0.7 + 4e-8), (0.9 - 4e-8, 0.1), (0.25, 0.75)] {
            let ray = Ray::new(Vector3::new(x, y, 2.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
            let hits = quad_hits(&ray);
            assert!(!hits.is_empty(), "ray at ({}, {}) slipped through", x, y);
            for hit in hits {
                assert!((hit.t - 2.0).abs() < 1e-5);
                assert!(hit.u >= 0.0 && hit.v >= 0.0 && hit.u + hit.v <= 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn ray_sliding_along_a_shared_edge_hits_the_quad() {
        // Grazing direction inside the plane x = 0.5 crossing the quad's edge
        // x + y = 1 from a tilted origin, as the centre column does on a mesh
        let ray = Ray::new(Vector3::new(0.5, 0.5 - 3.0, 3.0), Vector3::new(0.0, 1.0, -1.0)).unwrap();
        let hits = quad_hits(&ray);
        assert!(!hits.is_empty());
        assert!((ray.point_at(hits[0].t) - Vector3::new(0.5, 0.5, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn shared_vertex_is_hit() {
        let ray = Ray::new(Vector3::new(1.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        assert_eq!(quad_hits(&ray).len(), 2);
    }

    #[test]
    fn tolerance_does_not_widen_the_quad() {
        let ray = Ray::new(Vector3::new(1.01, 0.5, 1.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        assert!(quad_hits(&ray).is_empty());
    }
}
