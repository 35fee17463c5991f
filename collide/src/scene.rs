//! World selector construction and picking.
//!
//! The scene layer registers each collidable node once, with the kind of
//! collision geometry it carries, and builds one composite world selector from
//! them. Bodies then resolve against that selector, and pointer picking or
//! hit-scan shots go through `pick` / `pick_ray`.
//!
//! Design goals
//! - Deterministic: children are ordered by host id, whatever the registration order.
//! - Resolved once: the selector variant per node is decided here, never at query time.

use crate::geometry::{Aabb3, Line3, Vec3};
use crate::mesh::{MaterialId, Mesh};
use crate::octree::OctreeParams;
use crate::selector::{
    BoxSelector, CompositeSelector, Host, HostId, LineHit, MeshSelector, OctreeSelector,
    QueryFilter, TriangleSelector,
};
use crate::settings::CollisionSettings;

/// Collision geometry a node contributes to the world.
#[derive(Clone, Debug, Default)]
pub enum CollisionShape {
    /// Not collidable.
    #[default]
    None,
    /// Exact triangles of a static mesh, minus buffers drawn with ignored materials.
    TriangleMesh {
        mesh: Mesh,
        ignored_materials: Vec<MaterialId>,
    },
    /// 12-triangle box, for animated or otherwise changing shapes.
    BoundingBox(Aabb3),
}

/// One registered node.
#[derive(Clone, Debug)]
pub struct Collidable {
    pub host: Host,
    pub shape: CollisionShape,
}

/// Collects collidable nodes and builds the world selector.
#[derive(Clone, Debug, Default)]
pub struct WorldBuilder {
    collidables: Vec<Collidable>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. `CollisionShape::None` is accepted and contributes nothing.
    pub fn register(&mut self, host: Host, shape: CollisionShape) -> &mut Self {
        self.collidables.push(Collidable { host, shape });
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.collidables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.collidables.is_empty()
    }

    /// Build the world: one child selector per collidable node.
    ///
    /// Meshes with more triangles than `octree_min_triangles_per_node` get an
    /// octree selector, smaller ones a flat mesh selector. Nodes with malformed
    /// mesh data are skipped with a warning.
    pub fn build(&self, settings: &CollisionSettings) -> TriangleSelector {
        let params = OctreeParams {
            min_triangles_per_node: settings.octree_min_triangles_per_node,
            max_depth: settings.octree_max_depth,
        };

        let mut ordered: Vec<&Collidable> = self.collidables.iter().collect();
        ordered.sort_by_key(|c| c.host.id);

        let mut world = CompositeSelector::new();
        for c in ordered {
            match &c.shape {
                CollisionShape::None => {}
                CollisionShape::BoundingBox(aabb) => {
                    world.push(BoxSelector::new(*aabb, Some(c.host)));
                }
                CollisionShape::TriangleMesh {
                    mesh,
                    ignored_materials,
                } => {
                    let use_octree = mesh.triangle_count() > settings.octree_min_triangles_per_node;
                    let built = if use_octree {
                        OctreeSelector::new(mesh, ignored_materials, Some(c.host), params)
                            .map(TriangleSelector::from)
                    } else {
                        MeshSelector::new(mesh, ignored_materials, Some(c.host))
                            .map(TriangleSelector::from)
                    };
                    match built {
                        Ok(selector) => world.push(selector),
                        Err(e) => log::warn!("skipping collision mesh of {:?}: {e}", c.host.id),
                    }
                }
            }
        }

        log::debug!(
            "built world selector: {} children, {} triangles",
            world.len(),
            world.triangle_count()
        );
        world.into()
    }
}

/// Nearest hit along a segment, back faces ignored, e.g. for hit-scan shots.
pub fn pick(world: &TriangleSelector, line: &Line3, filter: &QueryFilter) -> Option<LineHit> {
    world.closest_line_collision(line, true, filter)
}

/// Nearest hit along a ray, for pointer picking.
///
/// `None` for a zero direction or a non-positive `max_distance`.
pub fn pick_ray(
    world: &TriangleSelector,
    origin: &Vec3,
    direction: &Vec3,
    max_distance: f32,
    filter: &QueryFilter,
) -> Option<LineHit> {
    let line = Line3::from_ray(*origin, direction, max_distance)?;
    pick(world, &line, filter)
}

/// Id of the node under the ray, if any.
pub fn pick_host(
    world: &TriangleSelector,
    origin: &Vec3,
    direction: &Vec3,
    max_distance: f32,
    filter: &QueryFilter,
) -> Option<HostId> {
    pick_ray(world, origin, direction, max_distance, filter).and_then(|h| h.host)
}
