use super::{Host, HostId, emit_triangles};
use crate::geometry::{Aabb3, Mat4, Triangle3};

/// Coarse stand-in for animated or otherwise dynamic shapes: the 12 triangles
/// (two per face, facing outward) of a box in the host's local space.
#[derive(Clone, Debug)]
pub struct BoxSelector {
    aabb: Aabb3,
    triangles: [Triangle3; 12],
    host: Option<Host>,
}

impl BoxSelector {
    pub fn new(aabb: Aabb3, host: Option<Host>) -> Self {
        Self {
            aabb,
            triangles: box_triangles(&aabb),
            host,
        }
    }

    /// Replace the box, e.g. after the shape animated.
    pub fn set_box(&mut self, aabb: Aabb3) {
        self.aabb = aabb;
        self.triangles = box_triangles(&aabb);
    }

    #[inline]
    pub fn local_box(&self) -> &Aabb3 {
        &self.aabb
    }

    #[inline]
    pub fn local_triangles(&self) -> &[Triangle3; 12] {
        &self.triangles
    }

    #[inline]
    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    #[inline]
    pub fn host_mut(&mut self) -> Option<&mut Host> {
        self.host.as_mut()
    }

    /// Always 12, or 0 for an empty box.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        if self.aabb.is_empty() { 0 } else { 12 }
    }

    pub fn clone_for_host(&self, host: Option<Host>) -> Self {
        Self {
            host,
            ..self.clone()
        }
    }

    fn active(&self) -> &[Triangle3] {
        &self.triangles[..self.triangle_count()]
    }

    pub(crate) fn visit_all<F>(&self, transform: Option<&Mat4>, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        emit_triangles(self.active(), self.host(), transform, None, visit);
    }

    pub(crate) fn visit_in_box<F>(&self, aabb: &Aabb3, transform: Option<&Mat4>, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        emit_triangles(self.active(), self.host(), transform, Some(aabb), visit);
    }
}

/// Corner indices follow `Aabb3::corners` (bit 0 = +X, bit 1 = +Y, bit 2 = +Z).
/// Each face is listed counter-clockwise seen from outside.
const FACES: [[usize; 4]; 6] = [
    [0, 4, 6, 2], // -X
    [1, 3, 7, 5], // +X
    [0, 1, 5, 4], // -Y
    [2, 6, 7, 3], // +Y
    [0, 2, 3, 1], // -Z
    [4, 5, 7, 6], // +Z
];

fn box_triangles(aabb: &Aabb3) -> [Triangle3; 12] {
    let c = aabb.corners();
    std::array::from_fn(|i| {
        let f = FACES[i / 2];
        if i % 2 == 0 {
            Triangle3::new(c[f[0]], c[f[1]], c[f[2]])
        } else {
            Triangle3::new(c[f[0]], c[f[2]], c[f[3]])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Line3, Vec3};
    use crate::selector::{QueryFilter, TriangleSelector};

    fn unit_box() -> Aabb3 {
        Aabb3::new(Vec3::repeat(-1.0), Vec3::repeat(1.0))
    }

    #[test]
    fn twelve_outward_facing_triangles() {
        let sel = BoxSelector::new(unit_box(), None);
        assert_eq!(sel.triangle_count(), 12);
        for t in sel.local_triangles() {
            let centroid = (t.a + t.b + t.c) / 3.0;
            // Outward: the normal points away from the box center.
            assert!(t.normal().dot(&centroid) > 0.0, "{t:?}");
            assert!(!t.is_degenerate());
        }
    }

    #[test]
    fn hits_every_face_from_outside() {
        let sel: TriangleSelector = BoxSelector::new(unit_box(), None).into();
        let filter = QueryFilter::new();
        for axis in 0..3 {
            for sign in [-1.0f32, 1.0] {
                let mut start = Vec3::new(0.2, 0.3, 0.1);
                start[axis] = 5.0 * sign;
                let mut end = start;
                end[axis] = 0.0;
                let hit = sel
                    .closest_line_collision(&Line3::new(start, end), true, &filter)
                    .unwrap();
                assert!((hit.point[axis] - sign).abs() < 1.0e-5);
            }
        }
    }

    #[test]
    fn set_box_follows_host_transform() {
        let host = Host::with_transform(HostId(4), Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)));
        let mut sel = BoxSelector::new(unit_box(), Some(host));
        sel.set_box(Aabb3::new(Vec3::zeros(), Vec3::repeat(2.0)));
        let sel: TriangleSelector = sel.into();
        let bounds = Aabb3::from_triangles(&sel.all_triangles(None, &QueryFilter::new()));
        assert_eq!(bounds.min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(12.0, 2.0, 2.0));
    }

    #[test]
    fn empty_box_has_no_triangles() {
        let sel: TriangleSelector = BoxSelector::new(Aabb3::empty(), None).into();
        assert_eq!(sel.triangle_count(), 0);
        assert!(sel.all_triangles(None, &QueryFilter::new()).is_empty());
    }
}
