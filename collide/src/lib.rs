pub mod error;
pub mod geometry;
pub mod mesh;
pub mod octree;
pub mod response;
pub mod scene;
pub mod selector;
pub mod settings;

pub use error::{ConfigError, SelectorError};
pub use geometry::{Aabb3, Line3, Mat4, Plane3, Triangle3, Vec3};
pub use mesh::{MaterialId, Mesh, MeshBuffer};
pub use octree::{Octree, OctreeParams};
pub use response::{
    CollisionCallback, CollisionEvent, CollisionHit, CollisionResponder, MoveOutcome,
    SweepOptions, resolve_move,
};
pub use scene::{CollisionShape, WorldBuilder, pick, pick_host, pick_ray};
pub use selector::{
    BoxSelector, CompositeSelector, Host, HostId, LineHit, MeshSelector, OctreeSelector,
    QueryFilter, TriangleSelector,
};
pub use settings::{
    CollisionSettings, DEFAULT_MAX_RECURSION_DEPTH, DEFAULT_OCTREE_MAX_DEPTH,
    DEFAULT_OCTREE_MIN_TRIANGLES, DEFAULT_SLIDING_TOLERANCE,
};
