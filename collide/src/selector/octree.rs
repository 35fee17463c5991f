use std::sync::Arc;

use super::{Emitter, Host, HostId};
use crate::error::SelectorError;
use crate::geometry::{Aabb3, Mat4, TransformKind, Triangle3};
use crate::mesh::{MaterialId, Mesh};
use crate::octree::{Octree, OctreeParams};

/// Mesh triangles indexed by an octree, for large static geometry.
///
/// The tree is built in the host's local space. Box queries move the world box
/// into local space with the inverse host transform, prune with the tree, then
/// apply the same per-triangle world-box test as the flat mesh selector.
#[derive(Clone, Debug)]
pub struct OctreeSelector {
    tree: Arc<Octree>,
    host: Option<Host>,
}

impl OctreeSelector {
    pub fn new(
        mesh: &Mesh,
        ignored_materials: &[MaterialId],
        host: Option<Host>,
        params: OctreeParams,
    ) -> Result<Self, SelectorError> {
        let triangles = mesh.collect_triangles(ignored_materials)?;
        let selector = Self::from_triangles(triangles, host, params);
        log::debug!(
            "octree selector for {:?}: {} triangles in {} nodes",
            host.map(|h| h.id),
            selector.tree.triangle_count(),
            selector.tree.node_count()
        );
        Ok(selector)
    }

    pub fn from_triangles(triangles: Vec<Triangle3>, host: Option<Host>, params: OctreeParams) -> Self {
        Self {
            tree: Arc::new(Octree::build(triangles, params)),
            host,
        }
    }

    #[inline]
    pub fn tree(&self) -> &Octree {
        &self.tree
    }

    #[inline]
    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    #[inline]
    pub fn host_mut(&mut self) -> Option<&mut Host> {
        self.host.as_mut()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.tree.triangle_count()
    }

    pub fn clone_for_host(&self, host: Option<Host>) -> Self {
        Self {
            tree: Arc::clone(&self.tree),
            host,
        }
    }

    pub(crate) fn visit_all<F>(&self, transform: Option<&Mat4>, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        let emitter = Emitter::new(self.host(), transform);
        self.tree.visit_all(|tri| emitter.emit(tri, None, visit));
    }

    pub(crate) fn visit_in_box<F>(&self, aabb: &Aabb3, transform: Option<&Mat4>, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        let emitter = Emitter::new(self.host(), transform);
        let to_local = match self.host() {
            None => Some(TransformKind::Identity),
            Some(h) => TransformKind::classify(&h.transform).inverse(),
        };

        match to_local {
            Some(to_local) => {
                let local_box = to_local.apply_aabb(aabb);
                self.tree
                    .visit_in_box(&local_box, |tri| emitter.emit(tri, Some(aabb), visit));
            }
            None => {
                // Singular host transform: no local box, test every triangle.
                self.tree.visit_all(|tri| emitter.emit(tri, Some(aabb), visit));
            }
        }
    }
}
