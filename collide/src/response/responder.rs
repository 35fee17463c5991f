use std::fmt;

use super::sweep::{CollisionHit, SweepOptions, resolve_move};
use crate::geometry::{Triangle3, Vec3, is_finite_vec};
use crate::selector::{HostId, QueryFilter, TriangleSelector};
use crate::settings::CollisionSettings;

/// What the body ran into during one `update`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionEvent {
    pub hit: CollisionHit,
    /// Node position the body asked for.
    pub requested: Vec3,
    /// Node position after collision response.
    pub corrected: Vec3,
}

/// Returns `true` when the event was handled and the uncorrected position should stand.
pub type CollisionCallback = Box<dyn FnMut(&CollisionEvent) -> bool + Send>;

/// Per-body collision response: moves a node through the world every frame,
/// applying gravity and tracking whether it stands on something.
///
/// The node is moved by its owner (input, pathing); `update` then turns the
/// raw move since the previous frame into a collision-free one.
pub struct CollisionResponder {
    radii: Vec3,
    /// Ellipsoid center relative to the node origin.
    ellipsoid_offset: Vec3,
    /// Acceleration, units/s^2.
    gravity: Vec3,
    options: SweepOptions,
    host: Option<HostId>,

    last_position: Option<Vec3>,
    falling: bool,
    falling_velocity: Vec3,
    pending_jump: Option<f32>,
    last_hit: Option<CollisionHit>,
    callback: Option<CollisionCallback>,
}

impl fmt::Debug for CollisionResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionResponder")
            .field("radii", &self.radii)
            .field("ellipsoid_offset", &self.ellipsoid_offset)
            .field("gravity", &self.gravity)
            .field("host", &self.host)
            .field("last_position", &self.last_position)
            .field("falling", &self.falling)
            .field("falling_velocity", &self.falling_velocity)
            .finish_non_exhaustive()
    }
}

impl CollisionResponder {
    /// Responder for the body attached to `host`; that node's own geometry is ignored.
    pub fn new(host: Option<HostId>, radii: Vec3, gravity: Vec3) -> Self {
        let filter = QueryFilter {
            exclude_host: host,
            ..QueryFilter::default()
        };
        Self {
            radii,
            ellipsoid_offset: Vec3::zeros(),
            gravity,
            options: SweepOptions::default().with_filter(filter),
            host,
            last_position: None,
            falling: false,
            falling_velocity: Vec3::zeros(),
            pending_jump: None,
            last_hit: None,
            callback: None,
        }
    }

    pub fn from_settings(settings: &CollisionSettings, host: Option<HostId>) -> Self {
        let mut responder = Self::new(host, settings.ellipsoid_radii, settings.gravity);
        responder.options = SweepOptions::from_settings(settings).with_filter(responder.options.filter);
        responder
    }

    pub fn with_ellipsoid_offset(mut self, offset: Vec3) -> Self {
        self.ellipsoid_offset = offset;
        self
    }

    pub fn with_callback(mut self, callback: CollisionCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Advance one frame.
    ///
    /// `node_position` is where the node's owner put it this frame. Returns the
    /// corrected node position, which the caller writes back to the node. The
    /// first call only records the position.
    pub fn update(&mut self, node_position: &Vec3, dt: f32, world: Option<&TriangleSelector>) -> Vec3 {
        let Some(last) = self.last_position else {
            self.last_position = Some(*node_position);
            return *node_position;
        };
        if !(dt.is_finite() && dt >= 0.0) || !is_finite_vec(node_position) {
            log::trace!("collision responder: skipping frame, dt {dt}, position {node_position:?}");
            return last;
        }

        if let Some(speed) = self.pending_jump.take() {
            self.falling_velocity = self.up() * speed;
        }
        self.falling_velocity += self.gravity * dt;

        let displacement = node_position - last;
        let fall = self.falling_velocity * dt;
        let outcome = resolve_move(
            &(last + self.ellipsoid_offset),
            &displacement,
            &self.radii,
            world,
            &fall,
            &self.options,
        );

        self.falling = outcome.falling;
        if !self.falling {
            self.falling_velocity = Vec3::zeros();
        }
        self.last_hit = outcome.hit;

        let mut corrected = outcome.position - self.ellipsoid_offset;
        if let (Some(hit), Some(callback)) = (outcome.hit, self.callback.as_mut()) {
            let event = CollisionEvent {
                hit,
                requested: *node_position,
                corrected,
            };
            if callback(&event) {
                corrected = *node_position;
            }
        }

        log::trace!(
            "collision responder {:?}: {:?} -> {:?} (falling: {}, iterations: {})",
            self.host,
            node_position,
            corrected,
            self.falling,
            outcome.iterations
        );
        self.last_position = Some(corrected);
        corrected
    }

    /// Start a jump at `speed` (units/s) against gravity. Ignored mid-air.
    pub fn jump(&mut self, speed: f32) -> bool {
        if self.falling {
            return false;
        }
        self.pending_jump = Some(speed);
        true
    }

    /// Teleport: the next update starts from `position` without sweeping there.
    pub fn reset_position(&mut self, position: Vec3) {
        self.last_position = Some(position);
        self.falling = false;
        self.falling_velocity = Vec3::zeros();
        self.pending_jump = None;
    }

    fn up(&self) -> Vec3 {
        (-self.gravity).try_normalize(0.0).unwrap_or_else(Vec3::y)
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.falling
    }

    #[inline]
    pub fn falling_velocity(&self) -> Vec3 {
        self.falling_velocity
    }

    #[inline]
    pub fn collision_occurred(&self) -> bool {
        self.last_hit.is_some()
    }

    pub fn collision_point(&self) -> Option<Vec3> {
        self.last_hit.map(|h| h.point)
    }

    pub fn collision_triangle(&self) -> Option<Triangle3> {
        self.last_hit.map(|h| h.triangle)
    }

    pub fn collision_host(&self) -> Option<HostId> {
        self.last_hit.and_then(|h| h.host)
    }

    pub fn radii(&self) -> Vec3 {
        self.radii
    }

    pub fn set_radii(&mut self, radii: Vec3) {
        self.radii = radii;
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    pub fn ellipsoid_offset(&self) -> Vec3 {
        self.ellipsoid_offset
    }

    pub fn set_ellipsoid_offset(&mut self, offset: Vec3) {
        self.ellipsoid_offset = offset;
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SweepOptions) {
        self.options = options;
    }
}
