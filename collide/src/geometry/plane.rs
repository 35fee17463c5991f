use super::types::Vec3;
use crate::settings::PARALLEL_EPS;

/// Plane `normal · p + d = 0`.
///
/// `normal` is unit length for planes built from well-formed input. Planes of
/// degenerate triangles carry a zero normal; every query on them reports
/// "no intersection".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane3 {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane3 {
    /// Plane through `point` with the given normal (normalized here).
    pub fn from_point_normal(point: &Vec3, normal: &Vec3) -> Self {
        let normal = normal.try_normalize(0.0).unwrap_or_else(Vec3::zeros);
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane through three points, normal following the right-hand winding a → b → c.
    pub fn from_points(a: &Vec3, b: &Vec3, c: &Vec3) -> Self {
        let normal = (b - a).cross(&(c - a));
        Self::from_point_normal(a, &normal)
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::zeros()
    }

    /// Signed distance; positive on the side the normal points to.
    #[inline]
    pub fn distance_to(&self, p: &Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    /// Front facing toward someone looking along `direction`.
    #[inline]
    pub fn is_front_facing(&self, direction: &Vec3) -> bool {
        self.normal.dot(direction) <= 0.0
    }

    /// Orthogonal projection of `p` onto the plane.
    #[inline]
    pub fn project_point(&self, p: &Vec3) -> Vec3 {
        p - self.normal * self.distance_to(p)
    }

    /// Parameter `t` where `origin + t * direction` meets the plane.
    ///
    /// Returns `None` for (near) parallel lines and degenerate planes.
    pub fn line_parameter(&self, origin: &Vec3, direction: &Vec3) -> Option<f32> {
        let denom = self.normal.dot(direction);
        if denom.abs() <= PARALLEL_EPS {
            return None;
        }
        Some(-self.distance_to(origin) / denom)
    }
}
