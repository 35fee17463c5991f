use std::sync::Arc;

use super::{Host, HostId, emit_triangles};
use crate::error::SelectorError;
use crate::geometry::{Aabb3, Mat4, Triangle3};
use crate::mesh::{MaterialId, Mesh};

/// Flat triangle list taken from a mesh.
///
/// Triangles are stored in the host's local space and moved to world space at
/// query time, so the selector follows its node without being rebuilt.
#[derive(Clone, Debug)]
pub struct MeshSelector {
    triangles: Arc<[Triangle3]>,
    host: Option<Host>,
}

impl MeshSelector {
    /// Flatten `mesh`, dropping buffers drawn with an ignored material.
    pub fn new(
        mesh: &Mesh,
        ignored_materials: &[MaterialId],
        host: Option<Host>,
    ) -> Result<Self, SelectorError> {
        let triangles = mesh.collect_triangles(ignored_materials)?;
        log::debug!(
            "mesh selector for {:?}: {} triangles",
            host.map(|h| h.id),
            triangles.len()
        );
        Ok(Self::from_triangles(triangles, host))
    }

    pub fn from_triangles(triangles: Vec<Triangle3>, host: Option<Host>) -> Self {
        Self {
            triangles: triangles.into(),
            host,
        }
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
        self.triangles.len()
    }

    /// Local-space triangles.
    #[inline]
    pub fn local_triangles(&self) -> &[Triangle3] {
        &self.triangles
    }

    pub fn clone_for_host(&self, host: Option<Host>) -> Self {
        Self {
            triangles: Arc::clone(&self.triangles),
            host,
        }
    }

    pub(crate) fn visit_all<F>(&self, transform: Option<&Mat4>, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        emit_triangles(self.triangles.iter(), self.host(), transform, None, visit);
    }

    pub(crate) fn visit_in_box<F>(&self, aabb: &Aabb3, transform: Option<&Mat4>, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        emit_triangles(self.triangles.iter(), self.host(), transform, Some(aabb), visit);
    }
}
