/*!
Collision response: moving an ellipsoid through the world.

- sweep:     ellipsoid-space sweep-and-slide (`resolve_move`), pure and stateless
- responder: per-body state on top of it (gravity, falling, jumping, last hit)

Both take the world selector by reference per call, so any number of bodies can
resolve against one shared world.
*/

pub mod responder;
pub mod sweep;

pub use responder::{CollisionCallback, CollisionEvent, CollisionResponder};
pub use sweep::{CollisionHit, MoveOutcome, SweepOptions, resolve_move};
