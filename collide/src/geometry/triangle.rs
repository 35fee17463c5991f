use super::aabb::Aabb3;
use super::plane::Plane3;
use super::types::{Mat4, Vec3, transform_point};
use crate::settings::POINT_IN_TRIANGLE_EPS;

/// Triangle given by three corners, wound counter-clockwise around its normal.
///
/// The normal is `(b - a) x (c - a)`, and only its side is solid: sweeps and
/// back-face culled line queries pass through from behind. A floor listed
/// clockwise when seen from above faces down and does not hold anything up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle3 {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle3 {
    #[inline]
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn points(&self) -> [Vec3; 3] {
        [self.a, self.b, self.c]
    }

    /// Supporting plane. Zero normal for collinear or zero-area triangles.
    #[inline]
    pub fn plane(&self) -> Plane3 {
        Plane3::from_points(&self.a, &self.b, &self.c)
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.plane().normal
    }

    #[inline]
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points(&[self.a, self.b, self.c])
    }

    #[inline]
    pub fn is_front_facing(&self, direction: &Vec3) -> bool {
        self.plane().is_front_facing(direction)
    }

    pub fn is_degenerate(&self) -> bool {
        self.plane().is_degenerate()
    }

    /// Point-in-triangle test for a point (approximately) on the triangle's plane.
    ///
    /// Uses barycentric coordinates with a small tolerance so points on edges count
    /// as inside. Degenerate triangles contain nothing.
    pub fn contains_point(&self, p: &Vec3) -> bool {
        let v0 = self.c - self.a;
        let v1 = self.b - self.a;
        let v2 = p - self.a;

        let dot00 = v0.dot(&v0);
        let dot01 = v0.dot(&v1);
        let dot02 = v0.dot(&v2);
        let dot11 = v1.dot(&v1);
        let dot12 = v1.dot(&v2);

        let denom = dot00 * dot11 - dot01 * dot01;
        if denom.abs() <= f32::EPSILON * dot00 * dot11 || denom == 0.0 {
            return false;
        }

        let inv = 1.0 / denom;
        let u = (dot11 * dot02 - dot01 * dot12) * inv;
        let v = (dot00 * dot12 - dot01 * dot02) * inv;
        u >= -POINT_IN_TRIANGLE_EPS
            && v >= -POINT_IN_TRIANGLE_EPS
            && u + v <= 1.0 + POINT_IN_TRIANGLE_EPS
    }

    /// Intersection with the segment `start → end`.
    ///
    /// Returns the hit point and its parameter `t` in `[0, 1]` along the segment.
    pub fn segment_intersection(&self, start: &Vec3, end: &Vec3) -> Option<(Vec3, f32)> {
        let dir = end - start;
        let t = self.plane().line_parameter(start, &dir)?;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        let p = start + dir * t;
        self.contains_point(&p).then_some((p, t))
    }

    pub fn transformed(&self, m: &Mat4) -> Self {
        Self {
            a: transform_point(m, &self.a),
            b: transform_point(m, &self.b),
            c: transform_point(m, &self.c),
        }
    }

    #[inline]
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self {
            a: self.a + offset,
            b: self.b + offset,
            c: self.c + offset,
        }
    }

    /// Componentwise scale of every corner.
    #[inline]
    pub fn scaled(&self, s: &Vec3) -> Self {
        Self {
            a: self.a.component_mul(s),
            b: self.b.component_mul(s),
            c: self.c.component_mul(s),
        }
    }
}
