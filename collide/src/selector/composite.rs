use super::{HostId, QueryFilter, TriangleSelector};
use crate::geometry::{Aabb3, Mat4, Triangle3};

/// Ordered union of child selectors, usually one per collidable node.
///
/// Queries go to every child in order; a child owned by the filtered host is
/// skipped entirely. Nearest-hit queries run one visit over all children, so the
/// closest hit is global and not per child.
#[derive(Clone, Debug, Default)]
pub struct CompositeSelector {
    children: Vec<TriangleSelector>,
}

impl CompositeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(children: Vec<TriangleSelector>) -> Self {
        Self { children }
    }

    pub fn push(&mut self, child: impl Into<TriangleSelector>) {
        self.children.push(child.into());
    }

    /// Drop every direct child attached to `host`. Returns how many were removed.
    pub fn remove_host(&mut self, host: HostId) -> usize {
        let before = self.children.len();
        self.children
            .retain(|c| c.host().is_none_or(|h| h.id != host));
        before - self.children.len()
    }

    /// First direct child attached to `host`, e.g. to update its transform.
    pub fn child_for_host_mut(&mut self, host: HostId) -> Option<&mut TriangleSelector> {
        self.children
            .iter_mut()
            .find(|c| c.host().is_some_and(|h| h.id == host))
    }

    #[inline]
    pub fn children(&self) -> &[TriangleSelector] {
        &self.children
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.children.iter().map(TriangleSelector::triangle_count).sum()
    }

    pub(crate) fn visit_all<F>(&self, transform: Option<&Mat4>, filter: &QueryFilter, visit: &mut F)
    where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        for child in &self.children {
            child.visit_all(transform, filter, visit);
        }
    }

    pub(crate) fn visit_in_box<F>(
        &self,
        aabb: &Aabb3,
        transform: Option<&Mat4>,
        filter: &QueryFilter,
        visit: &mut F,
    ) where
        F: FnMut(&Triangle3, Option<HostId>),
    {
        for child in &self.children {
            child.visit_in_box(aabb, transform, filter, visit);
        }
    }
}
