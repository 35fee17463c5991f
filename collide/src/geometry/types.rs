/*!
Math aliases shared by every geometry and collision module.

All coordinates are `f32`. Transforms are affine 4x4 matrices in nalgebra's
column-major convention, applied as `m * p` to homogeneous points.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Mat4 = na::Matrix4<f32>;

/// Transform a position (w = 1) by an affine matrix.
#[inline]
pub fn transform_point(m: &Mat4, p: &Vec3) -> Vec3 {
    m.transform_point(&Point3::from(*p)).coords
}

/// Translation column of an affine matrix.
#[inline]
pub fn translation_of(m: &Mat4) -> Vec3 {
    Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// True when every component is finite (no NaN, no infinity).
#[inline]
pub fn is_finite_vec(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}
