/*!
Geometry primitives used by the selectors and the response solver.

- types:     nalgebra aliases (`Vec3`, `Mat4`) and point helpers
- aabb:      axis-aligned box with an explicit empty state
- plane:     `normal · p + d = 0` planes
- triangle:  triangles, point-in-triangle and segment intersection
- line:      finite segments for picking
- transform: identity / translate / affine fast paths
*/

pub mod aabb;
pub mod line;
pub mod plane;
pub mod transform;
pub mod triangle;
pub mod types;

pub use aabb::Aabb3;
pub use line::Line3;
pub use plane::Plane3;
pub use transform::TransformKind;
pub use triangle::Triangle3;
pub use types::{Mat4, Point3, Vec3, is_finite_vec, transform_point};
