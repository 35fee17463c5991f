use super::aabb::Aabb3;
use super::types::Vec3;

/// Finite segment from `start` to `end`, used for picking and hit-scan queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line3 {
    pub start: Vec3,
    pub end: Vec3,
}

impl Line3 {
    #[inline]
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Segment of length `max_distance` from `origin` along `direction`.
    ///
    /// `None` for a zero direction or a non-positive (or NaN) length.
    pub fn from_ray(origin: Vec3, direction: &Vec3, max_distance: f32) -> Option<Self> {
        if !(max_distance > 0.0) {
            return None;
        }
        let dir = direction.try_normalize(0.0)?;
        Some(Self::new(origin, origin + dir * max_distance))
    }

    #[inline]
    pub fn vector(&self) -> Vec3 {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.vector().norm()
    }

    /// Unit direction, `None` for a zero-length segment.
    #[inline]
    pub fn direction(&self) -> Option<Vec3> {
        self.vector().try_normalize(0.0)
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start + self.vector() * t
    }

    #[inline]
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::new(self.start, self.end)
    }
}
