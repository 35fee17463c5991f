/*!
Triangle selectors: the query side of the collision core.

A selector answers three questions about the triangles of one or more scene
nodes:
- every triangle (optionally transformed by a caller matrix),
- a superset of the triangles overlapping a world-space box,
- the nearest hit along a segment.

Variants:
- mesh:      flat triangle list flattened from a mesh at construction
- bbox:      12-triangle stand-in built from a box
- composite: ordered union of child selectors
- octree:    mesh triangles indexed by an `Octree`

The node to ignore and the "skip invisible" flag travel with every call in a
`QueryFilter`; selectors hold no per-query mutable state, so one world selector
can serve several bodies at once.
*/

pub mod bbox;
pub mod composite;
pub mod mesh;
pub mod octree;

pub use bbox::BoxSelector;
pub use composite::CompositeSelector;
pub use mesh::MeshSelector;
pub use octree::OctreeSelector;

use crate::geometry::{Aabb3, Line3, Mat4, TransformKind, Triangle3, Vec3};

/// Identity of the scene node a selector belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(pub u32);

/// The node a selector's geometry is attached to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Host {
    pub id: HostId,
    /// Local-to-world transform of the node.
    pub transform: Mat4,
    pub visible: bool,
}

impl Host {
    pub fn new(id: HostId) -> Self {
        Self {
            id,
            transform: Mat4::identity(),
            visible: true,
        }
    }

    pub fn with_transform(id: HostId, transform: Mat4) -> Self {
        Self {
            transform,
            ..Self::new(id)
        }
    }
}

/// Per-call query options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryFilter {
    /// Geometry of this node is skipped (a body must not collide with itself).
    pub exclude_host: Option<HostId>,
    /// Skip geometry of hidden nodes.
    pub skip_invisible: bool,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn excluding(host: HostId) -> Self {
        Self {
            exclude_host: Some(host),
            ..Self::default()
        }
    }

    pub fn skip_invisible(mut self, skip: bool) -> Self {
        self.skip_invisible = skip;
        self
    }

    /// True when geometry owned by `host` must not be reported.
    #[inline]
    pub fn rejects(&self, host: Option<&Host>) -> bool {
        match host {
            None => false,
            Some(h) => self.exclude_host == Some(h.id) || (self.skip_invisible && !h.visible),
        }
    }
}

/// Nearest segment hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineHit {
    pub point: Vec3,
    pub triangle: Triangle3,
    pub host: Option<HostId>,
    /// Distance from the segment start to `point`.
    pub distance: f32,
}

#[derive(Clone, Debug)]
pub enum TriangleSelector {
    Mesh(MeshSelector),
    BoxProxy(BoxSelector),
    Composite(CompositeSelector),
    Octree(OctreeSelector),
}

impl From<MeshSelector> for TriangleSelector {
    fn from(s: MeshSelector) -> Self {
        Self::Mesh(s)
    }
}

impl From<BoxSelector> for TriangleSelector {
    fn from(s: BoxSelector) -> Self {
        Self::BoxProxy(s)
    }
}

impl From<CompositeSelector> for TriangleSelector {
    fn from(s: CompositeSelector) -> Self {
        Self::Composite(s)
    }
}

impl From<OctreeSelector> for TriangleSelector {
    fn from(s: OctreeSelector) -> Self {
        Self::Octree(s)
    }
}

impl TriangleSelector {
    /// Node this selector is attached to; `None` for composites and detached selectors.
    pub fn host(&self) -> Option<&Host> {
        match self {
            Self::Mesh(s) => s.host(),
            Self::BoxProxy(s) => s.host(),
            Self::Composite(_) => None,
            Self::Octree(s) => s.host(),
        }
    }

    pub fn host_mut(&mut self) -> Option<&mut Host> {
        match self {
            Self::Mesh(s) => s.host_mut(),
            Self::BoxProxy(s) => s.host_mut(),
            Self::Composite(_) => None,
            Self::Octree(s) => s.host_mut(),
        }
    }

    /// Update the host's world transform (after the node moved).
    pub fn set_host_transform(&mut self, transform: Mat4) {
        if let Some(h) = self.host_mut() {
            h.transform = transform;
        }
    }

    pub fn set_host_visible(&mut self, visible: bool) {
        if let Some(h) = self.host_mut() {
            h.visible = visible;
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Self::Mesh(s) => s.triangle_count(),
            Self::BoxProxy(s) => s.triangle_count(),
            Self::Composite(s) => s.triangle_count(),
            Self::Octree(s) => s.triangle_count(),
        }
    }

    /// Independent copy bound to another node. Triangle data is shared, host state is not.
    pub fn clone_for_host(&self, host: Option<Host>) -> Self {
        match self {
            Self::Mesh(s) => Self::Mesh(s.clone_for_host(host)),
            Self::BoxProxy(s) => Self::BoxProxy(s.clone_for_host(host)),
            Self::Composite(s) => Self::Composite(s.clone()),
            Self::Octree(s) => Self::Octree(s.clone_for_host(host)),
        }
    }

    /// Visit every triangle with its owning node, transformed by `transform * host`.
    pub fn visit_all<F>(&self, transform: Option<&Mat4>, filter: &QueryFilter, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        if filter.rejects(self.host()) {
            return;
        }
        match self {
            Self::Mesh(s) => s.visit_all(transform, visit),
            Self::BoxProxy(s) => s.visit_all(transform, visit),
            Self::Composite(s) => s.visit_all(transform, filter, visit),
            Self::Octree(s) => s.visit_all(transform, visit),
        }
    }

    /// Visit a superset of the triangles overlapping the world-space `aabb`.
    pub fn visit_in_box<F>(
        &self,
        aabb: &Aabb3,
        transform: Option<&Mat4>,
        filter: &QueryFilter,
        visit: &mut F,
    ) where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        if filter.rejects(self.host()) || aabb.is_empty() {
            return;
        }
        match self {
            Self::Mesh(s) => s.visit_in_box(aabb, transform, visit),
            Self::BoxProxy(s) => s.visit_in_box(aabb, transform, visit),
            Self::Composite(s) => s.visit_in_box(aabb, transform, filter, visit),
            Self::Octree(s) => s.visit_in_box(aabb, transform, visit),
        }
    }

    pub fn all_triangles(&self, transform: Option<&Mat4>, filter: &QueryFilter) -> Vec<Triangle3> {
        let mut out = Vec::with_capacity(self.triangle_count());
        self.visit_all(transform, filter, &mut |t, _| out.push(*t));
        out
    }

    pub fn triangles_in_box(
        &self,
        aabb: &Aabb3,
        transform: Option<&Mat4>,
        filter: &QueryFilter,
    ) -> Vec<Triangle3> {
        let mut out = Vec::new();
        self.visit_in_box(aabb, transform, filter, &mut |t, _| out.push(*t));
        out
    }

    /// Nearest intersection of the segment with any selected triangle.
    ///
    /// Back-facing triangles (normal pointing along the segment) are skipped when
    /// `ignore_backfaces` is set. Among hits at equal distance the first one
    /// visited wins.
    pub fn closest_line_collision(
        &self,
        line: &Line3,
        ignore_backfaces: bool,
        filter: &QueryFilter,
    ) -> Option<LineHit> {
        let direction = line.direction()?;
        let length = line.length();
        let segment_box = line.aabb();
        let mut best: Option<LineHit> = None;

        self.visit_in_box(&segment_box, None, filter, &mut |tri, host| {
            if ignore_backfaces && !tri.is_front_facing(&direction) {
                return;
            }

            // Cheap rejects: outside the segment's extent, or farther than the best hit.
            let tri_box = tri.aabb();
            if !tri_box.intersects(&segment_box) {
                return;
            }
            if let Some(b) = &best {
                if tri_box.distance_sq_to_point(&line.start) >= b.distance * b.distance {
                    return;
                }
            }

            let Some((point, t)) = tri.segment_intersection(&line.start, &line.end) else {
                return;
            };
            let distance = t * length;
            if best.as_ref().is_none_or(|b| distance < b.distance) {
                best = Some(LineHit {
                    point,
                    triangle: *tri,
                    host,
                    distance,
                });
            }
        });

        best
    }
}

/// Moves local-space triangles through a host transform and the caller's
/// transform, classified once per query.
pub(crate) struct Emitter {
    to_world: TransformKind,
    to_output: Option<TransformKind>,
    id: Option<HostId>,
}

impl Emitter {
    pub(crate) fn new(host: Option<&Host>, transform: Option<&Mat4>) -> Self {
        let host_matrix = host.map(|h| &h.transform);
        Self {
            to_world: TransformKind::compose(host_matrix, None),
            to_output: transform.map(|_| TransformKind::compose(transform, host_matrix)),
            id: host.map(|h| h.id),
        }
    }

    /// Emit `tri` unless its world-space bounds miss `world_box`.
    #[inline]
    pub(crate) fn emit<F>(&self, tri: &Triangle3, world_box: Option<&Aabb3>, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        let world = self.to_world.apply_triangle(tri);
        if let Some(world_box) = world_box {
            if !world.aabb().intersects(world_box) {
                return;
            }
        }
        match &self.to_output {
            Some(kind) => visit(&kind.apply_triangle(tri), self.id),
            None => visit(&world, self.id),
        }
    }
}

/// Emit `triangles` (local space) through `host` and the caller's transform,
/// keeping those whose world-space bounds overlap `world_box` when one is given.
pub(crate) fn emit_triangles<'a, I, F>(
    triangles: I,
    host: Option<&Host>,
    transform: Option<&Mat4>,
    world_box: Option<&Aabb3>,
    visit: &mut F,
) where
    I: IntoIterator<Item = &'a Triangle3>,
    F: FnMut(&Triangle3, Option<HostId>),
{
    let emitter = Emitter::new(host, transform);
    for tri in triangles {
        emitter.emit(tri, world_box, visit);
    }
}
