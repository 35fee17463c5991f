use super::types::{Mat4, Vec3, transform_point};
use super::triangle::Triangle3;

/// Axis-aligned bounding box.
///
/// A box is either *empty* (no point added yet, `min > max` on every axis) or
/// satisfies `min <= max` componentwise. Empty is a real state: it intersects
/// nothing and contains nothing, unlike a zero-size box around a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb3 {
    /// The empty box; adding a point makes it a zero-size box around that point.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Box spanning two opposite corners, in any order.
    #[inline]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.add_point(p);
        }
        aabb
    }

    /// Bounding box of a triangle list; empty for an empty list.
    pub fn from_triangles(triangles: &[Triangle3]) -> Self {
        let mut aabb = Self::empty();
        for t in triangles {
            aabb.merge(&t.aabb());
        }
        aabb
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Empty, or shrunk to a single point. Such a box cannot be subdivided.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || self.min == self.max
    }

    #[inline]
    pub fn add_point(&mut self, p: &Vec3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn merge(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.add_point(&other.min);
        self.add_point(&other.max);
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::zeros()
        } else {
            self.max - self.min
        }
    }

    /// The 8 corners; bit 0 of the index selects max.x, bit 1 max.y, bit 2 max.z.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            )
        })
    }

    /// Grow by `margin` on each side (per axis). Empty stays empty.
    pub fn inflate(&self, margin: &Vec3) -> Aabb3 {
        if self.is_empty() {
            return *self;
        }
        Aabb3 {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Test two boxes for overlap; touching faces count as overlap.
    #[inline]
    pub fn intersects(&self, other: &Aabb3) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y
            || self.max.z < other.min.z
            || self.min.z > other.max.z)
    }

    #[inline]
    pub fn contains_point(&self, p: &Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// All three vertices inside (boundary inclusive).
    #[inline]
    pub fn contains_triangle(&self, t: &Triangle3) -> bool {
        self.contains_point(&t.a) && self.contains_point(&t.b) && self.contains_point(&t.c)
    }

    /// Squared distance from `p` to the closest point of the box; zero inside.
    pub fn distance_sq_to_point(&self, p: &Vec3) -> f32 {
        if self.is_empty() {
            return f32::INFINITY;
        }
        let clamped = p.sup(&self.min).inf(&self.max);
        (clamped - p).norm_squared()
    }

    /// Bounding box of this box's corners after an affine transform.
    pub fn transformed(&self, m: &Mat4) -> Aabb3 {
        if self.is_empty() {
            return *self;
        }
        let mut out = Aabb3::empty();
        for c in self.corners() {
            out.add_point(&transform_point(m, &c));
        }
        out
    }
}
