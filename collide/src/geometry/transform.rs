use super::aabb::Aabb3;
use super::triangle::Triangle3;
use super::types::{Mat4, Vec3, transform_point, translation_of};

/// A transform classified once per query so the per-triangle loop can take the
/// cheapest path: no-op, add an offset, or a full matrix multiply.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformKind {
    Identity,
    Translation(Vec3),
    Affine(Mat4),
}

impl TransformKind {
    pub fn classify(m: &Mat4) -> Self {
        let linear_is_identity =
            (0..3).all(|r| (0..3).all(|c| m[(r, c)] == if r == c { 1.0 } else { 0.0 }));
        let projective_row_is_identity =
            m[(3, 0)] == 0.0 && m[(3, 1)] == 0.0 && m[(3, 2)] == 0.0 && m[(3, 3)] == 1.0;

        if !(linear_is_identity && projective_row_is_identity) {
            return Self::Affine(*m);
        }

        let t = translation_of(m);
        if t == Vec3::zeros() {
            Self::Identity
        } else {
            Self::Translation(t)
        }
    }

    /// Classify `outer * inner`, where either side may be absent (identity).
    pub fn compose(outer: Option<&Mat4>, inner: Option<&Mat4>) -> Self {
        match (outer, inner) {
            (None, None) => Self::Identity,
            (Some(m), None) | (None, Some(m)) => Self::classify(m),
            (Some(o), Some(i)) => Self::classify(&(o * i)),
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    #[inline]
    pub fn apply_point(&self, p: &Vec3) -> Vec3 {
        match self {
            Self::Identity => *p,
            Self::Translation(t) => p + t,
            Self::Affine(m) => transform_point(m, p),
        }
    }

    #[inline]
    pub fn apply_triangle(&self, tri: &Triangle3) -> Triangle3 {
        match self {
            Self::Identity => *tri,
            Self::Translation(t) => tri.translated(t),
            Self::Affine(m) => tri.transformed(m),
        }
    }

    pub fn apply_aabb(&self, aabb: &Aabb3) -> Aabb3 {
        match self {
            Self::Identity => *aabb,
            Self::Translation(t) if !aabb.is_empty() => Aabb3 {
                min: aabb.min + t,
                max: aabb.max + t,
            },
            Self::Translation(_) => *aabb,
            Self::Affine(m) => aabb.transformed(m),
        }
    }

    /// Inverse transform, `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        match self {
            Self::Identity => Some(Self::Identity),
            Self::Translation(t) => Some(Self::Translation(-t)),
            Self::Affine(m) => m.try_inverse().map(Self::Affine),
        }
    }
}
