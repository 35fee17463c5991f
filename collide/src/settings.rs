/*!
Collision settings and tolerances.

The constants centralize the defaults used by the selectors, the octree and the
sweep-and-slide solver. `CollisionSettings` bundles the tunable ones so a scene
can load them from a TOML file instead of recompiling.

Notes
- Distances are world units, except `sliding_tolerance`, which applies in
  ellipsoid space (one unit = one ellipsoid radius).
- Time is in seconds, gravity in units per second squared.
*/

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::Vec3;

/// Gap kept between a swept ellipsoid and the surface it stops against.
/// Too large creates visible hovering; too small lets float error tunnel through.
pub const DEFAULT_SLIDING_TOLERANCE: f32 = 0.0005;

/// Slide iterations per sweep before the solver falls back to an epsilon step.
pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 5;

/// An octree node holding this many triangles or fewer is not subdivided.
/// Also the triangle count above which the scene builder picks the octree selector.
pub const DEFAULT_OCTREE_MIN_TRIANGLES: usize = 64;

/// Hard cap on octree depth.
pub const DEFAULT_OCTREE_MAX_DEPTH: u32 = 16;

/// Default gravity acceleration (units/s^2).
pub const DEFAULT_GRAVITY_Y: f32 = -9.8;

/// Default ellipsoid radii for a player-sized body.
pub const DEFAULT_RADIUS_XZ: f32 = 30.0;
pub const DEFAULT_RADIUS_Y: f32 = 60.0;

/// `|n · v|` at or below this counts as "moving parallel to the plane".
pub const PARALLEL_EPS: f32 = 1.0e-6;

/// Barycentric slack so points on a shared edge hit both triangles.
pub const POINT_IN_TRIANGLE_EPS: f32 = 1.0e-5;

/// Tunable collision parameters for one scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    pub sliding_tolerance: f32,
    pub max_recursion_depth: u32,
    pub octree_min_triangles_per_node: usize,
    pub octree_max_depth: u32,
    pub gravity: Vec3,
    pub ellipsoid_radii: Vec3,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            sliding_tolerance: DEFAULT_SLIDING_TOLERANCE,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            octree_min_triangles_per_node: DEFAULT_OCTREE_MIN_TRIANGLES,
            octree_max_depth: DEFAULT_OCTREE_MAX_DEPTH,
            gravity: Vec3::new(0.0, DEFAULT_GRAVITY_Y, 0.0),
            ellipsoid_radii: Vec3::new(DEFAULT_RADIUS_XZ, DEFAULT_RADIUS_Y, DEFAULT_RADIUS_XZ),
        }
    }
}

impl CollisionSettings {
    /// Parse settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&source)?;
        log::debug!("loaded collision settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Reject values the solver cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sliding_tolerance.is_finite() && self.sliding_tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sliding_tolerance must be positive, got {}",
                self.sliding_tolerance
            )));
        }
        if self.octree_min_triangles_per_node == 0 {
            return Err(ConfigError::Invalid(
                "octree_min_triangles_per_node must be at least 1".into(),
            ));
        }
        let radii = &self.ellipsoid_radii;
        if !(radii.x > 0.0 && radii.y > 0.0 && radii.z > 0.0) || !crate::geometry::is_finite_vec(radii)
        {
            return Err(ConfigError::Invalid(format!(
                "ellipsoid_radii must be positive, got {radii:?}"
            )));
        }
        if !crate::geometry::is_finite_vec(&self.gravity) {
            return Err(ConfigError::Invalid("gravity must be finite".into()));
        }
        Ok(())
    }
}
