/*!
Octree over a static triangle list.

Each node stores the triangles that do not fit entirely inside any of its eight
octants; fully contained triangles move down to the first octant that holds
them. A triangle therefore lives in exactly one node, so a box query visits
every stored triangle at most once and can skip any subtree whose bounds miss
the query box.

Nodes live in a flat arena. Both construction and queries use an explicit
worklist instead of call-stack recursion, and depth is capped by
`OctreeParams::max_depth`.

The tree is immutable after construction. A deformed mesh means building a new
tree.
*/

use crate::geometry::{Aabb3, Triangle3};
use crate::settings::{DEFAULT_OCTREE_MAX_DEPTH, DEFAULT_OCTREE_MIN_TRIANGLES};

/// Subdivision limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctreeParams {
    /// Nodes with this many triangles or fewer become leaves.
    pub min_triangles_per_node: usize,
    pub max_depth: u32,
}

impl Default for OctreeParams {
    fn default() -> Self {
        Self {
            min_triangles_per_node: DEFAULT_OCTREE_MIN_TRIANGLES,
            max_depth: DEFAULT_OCTREE_MAX_DEPTH,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OctreeNode {
    /// Bounds of every triangle that entered this node, children's included.
    pub aabb: Aabb3,
    /// Triangles straddling octant boundaries (or all of them, for a leaf).
    pub triangles: Vec<Triangle3>,
    /// Arena indices of the children, by octant (bit layout of `Aabb3::corners`).
    pub children: [Option<usize>; 8],
}

impl OctreeNode {
    fn pending() -> Self {
        Self {
            aabb: Aabb3::empty(),
            triangles: Vec::new(),
            children: [None; 8],
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    triangle_count: usize,
    depth: u32,
}

impl Octree {
    /// Build the tree. An empty input gives a tree without a root.
    pub fn build(triangles: Vec<Triangle3>, params: OctreeParams) -> Self {
        let triangle_count = triangles.len();
        if triangles.is_empty() {
            return Self::default();
        }

        let min_per_node = params.min_triangles_per_node.max(1);
        let mut nodes = vec![OctreeNode::pending()];
        let mut depth = 0;
        let mut work: Vec<(usize, Vec<Triangle3>, u32)> = vec![(0, triangles, 0)];

        while let Some((index, triangles, level)) = work.pop() {
            depth = depth.max(level);
            let aabb = Aabb3::from_triangles(&triangles);

            if aabb.is_degenerate() || triangles.len() <= min_per_node || level >= params.max_depth
            {
                nodes[index].aabb = aabb;
                nodes[index].triangles = triangles;
                continue;
            }

            let center = aabb.center();
            let octants = aabb.corners().map(|corner| Aabb3::new(center, corner));

            let mut pending: [Vec<Triangle3>; 8] = Default::default();
            let mut keep = Vec::new();
            for tri in triangles {
                match octants.iter().position(|o| o.contains_triangle(&tri)) {
                    Some(octant) => pending[octant].push(tri),
                    None => keep.push(tri),
                }
            }

            nodes[index].aabb = aabb;
            nodes[index].triangles = keep;

            for (octant, list) in pending.into_iter().enumerate() {
                if list.is_empty() {
                    continue;
                }
                let child = nodes.len();
                nodes.push(OctreeNode::pending());
                nodes[index].children[octant] = Some(child);
                work.push((child, list, level + 1));
            }
        }

        log::debug!(
            "built octree: {} triangles, {} nodes, depth {}",
            triangle_count,
            nodes.len(),
            depth
        );

        Self {
            nodes,
            triangle_count,
            depth,
        }
    }

    #[inline]
    pub fn root(&self) -> Option<&OctreeNode> {
        self.nodes.first()
    }

    #[inline]
    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Deepest level reached (root = 0).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Bounds of the whole tree; empty for an empty tree.
    pub fn bounds(&self) -> Aabb3 {
        self.root().map_or_else(Aabb3::empty, |r| r.aabb)
    }

    /// Visit every triangle stored in a node whose bounds intersect `aabb`.
    ///
    /// This is a superset of the triangles overlapping the box.
    pub fn visit_in_box<F: FnMut(&Triangle3)>(&self, aabb: &Aabb3, mut visit: F) {
        self.walk(|node| node.aabb.intersects(aabb), &mut visit);
    }

    /// Visit every triangle once.
    pub fn visit_all<F: FnMut(&Triangle3)>(&self, mut visit: F) {
        self.walk(|_| true, &mut visit);
    }

    fn walk<P, F>(&self, enter: P, visit: &mut F)
    where
        P: Fn(&OctreeNode) -> bool,
        F: FnMut(&Triangle3),
    {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !enter(node) {
                continue;
            }
            for tri in &node.triangles {
                visit(tri);
            }
            // Reverse so children pop in octant order.
            stack.extend(node.children.iter().rev().flatten());
        }
    }

    /// Triangles in the subtree of `node`, for diagnostics.
    pub fn subtree_triangle_count(&self, node: usize) -> usize {
        let mut count = 0;
        let mut stack = vec![node];
        while let Some(index) = stack.pop() {
            let Some(n) = self.nodes.get(index) else {
                continue;
            };
            count += n.triangles.len();
            stack.extend(n.children.iter().flatten());
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    fn grid(n: usize) -> Vec<Triangle3> {
        // n x n small floor triangles spread over [0, n) in X and Z.
        let mut out = Vec::new();
        for i in 0..n {
            for j in 0..n {
                let o = Vec3::new(i as f32, 0.0, j as f32);
                out.push(Triangle3::new(
                    o + Vec3::new(0.1, 0.0, 0.1),
                    o + Vec3::new(0.1, 0.0, 0.9),
                    o + Vec3::new(0.9, 0.0, 0.1),
                ));
            }
        }
        out
    }

    #[test]
    fn empty_input_has_no_root() {
        let tree = Octree::build(Vec::new(), OctreeParams::default());
        assert!(tree.root().is_none());
        assert!(tree.bounds().is_empty());
        let mut n = 0;
        tree.visit_all(|_| n += 1);
        assert_eq!(n, 0);
    }

    #[test]
    fn small_input_stays_a_single_leaf() {
        let tree = Octree::build(grid(4), OctreeParams::default());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().unwrap().is_leaf());
        assert_eq!(tree.root().unwrap().triangles.len(), 16);
    }

    #[test]
    fn subdivision_keeps_every_triangle_once() {
        let params = OctreeParams {
            min_triangles_per_node: 4,
            max_depth: 16,
        };
        let tree = Octree::build(grid(16), params);
        assert!(tree.node_count() > 1);
        assert_eq!(tree.subtree_triangle_count(0), 256);
        let mut n = 0;
        tree.visit_all(|_| n += 1);
        assert_eq!(n, 256);
    }

    #[test]
    fn children_are_contained_in_parent_octant() {
        let params = OctreeParams {
            min_triangles_per_node: 2,
            max_depth: 16,
        };
        let tree = Octree::build(grid(8), params);
        for node in tree.nodes() {
            for (octant, child) in node.children.iter().enumerate() {
                let Some(child) = child else { continue };
                let bounds = Aabb3::new(node.aabb.center(), node.aabb.corners()[octant]);
                for tri in &tree.nodes()[*child].triangles {
                    assert!(bounds.contains_triangle(tri));
                }
            }
        }
    }

    #[test]
    fn box_query_prunes_far_subtrees() {
        let params = OctreeParams {
            min_triangles_per_node: 4,
            max_depth: 16,
        };
        let tree = Octree::build(grid(16), params);
        let probe = Aabb3::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let mut hits = Vec::new();
        tree.visit_in_box(&probe, |t| hits.push(*t));
        assert!(hits.len() < 256);
        assert!(hits.iter().any(|t| t.aabb().intersects(&probe)));
    }

    #[test]
    fn depth_cap_is_respected() {
        let params = OctreeParams {
            min_triangles_per_node: 1,
            max_depth: 2,
        };
        let tree = Octree::build(grid(16), params);
        assert!(tree.depth() <= 2);
        assert_eq!(tree.subtree_triangle_count(0), 256);
    }

    #[test]
    fn identical_point_triangles_do_not_subdivide() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let tris = vec![Triangle3::new(p, p, p); 100];
        let tree = Octree::build(tris, OctreeParams::default());
        assert_eq!(tree.node_count(), 1);
    }
}
