use crate::geometry::{Aabb3, Mat4, Plane3, Triangle3, Vec3, is_finite_vec};
use crate::selector::{HostId, QueryFilter, TriangleSelector};
use crate::settings::{
    CollisionSettings, DEFAULT_MAX_RECURSION_DEPTH, DEFAULT_SLIDING_TOLERANCE, PARALLEL_EPS,
};

/// Quadratics whose leading coefficient is this small are treated as linear and skipped.
const QUADRATIC_EPS: f32 = 1.0e-12;

/// Solver knobs for one `resolve_move` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepOptions {
    /// Gap kept to the contact surface, in ellipsoid space.
    pub sliding_tolerance: f32,
    /// Slide iterations per pass before the epsilon fallback kicks in.
    pub max_recursion_depth: u32,
    /// Which geometry to ignore (usually the moving body's own node).
    pub filter: QueryFilter,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            sliding_tolerance: DEFAULT_SLIDING_TOLERANCE,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            filter: QueryFilter::default(),
        }
    }
}

impl SweepOptions {
    pub fn from_settings(settings: &CollisionSettings) -> Self {
        Self {
            sliding_tolerance: settings.sliding_tolerance,
            max_recursion_depth: settings.max_recursion_depth,
            filter: QueryFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Triangle that stopped the body, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionHit {
    pub point: Vec3,
    pub triangle: Triangle3,
    pub host: Option<HostId>,
}

/// Result of one `resolve_move`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveOutcome {
    /// Corrected ellipsoid center.
    pub position: Vec3,
    /// No floor under the body during the gravity pass.
    pub falling: bool,
    /// Last triangle hit, from the gravity pass if it touched anything.
    pub hit: Option<CollisionHit>,
    /// Slide iterations over both passes.
    pub iterations: u32,
}

impl MoveOutcome {
    fn unchanged(position: Vec3) -> Self {
        Self {
            position,
            falling: false,
            hit: None,
            iterations: 0,
        }
    }
}

/// Move an ellipsoid centered at `position` by `displacement`, then by `gravity`.
///
/// Notes
/// - `gravity` is a displacement for this step, not an acceleration.
/// - Invalid input (non-positive or non-finite radii, non-finite vectors) leaves
///   the body where it is.
/// - A missing or empty world never blocks anything.
///
/// Algorithm:
/// - Scale everything by `1 / radii` so the ellipsoid becomes a unit sphere.
/// - Sweep-and-slide the requested displacement (`collide_and_slide`).
/// - Sweep-and-slide the gravity displacement; the body is supported when this
///   pass touches a triangle whose normal is mostly vertical.
/// - Scale the result back to world space.
pub fn resolve_move(
    position: &Vec3,
    displacement: &Vec3,
    radii: &Vec3,
    world: Option<&TriangleSelector>,
    gravity: &Vec3,
    options: &SweepOptions,
) -> MoveOutcome {
    let radii_ok = is_finite_vec(radii) && radii.x > 0.0 && radii.y > 0.0 && radii.z > 0.0;
    if !radii_ok || !is_finite_vec(position) || !is_finite_vec(displacement) || !is_finite_vec(gravity)
    {
        log::trace!("resolve_move: invalid input, body left at {position:?}");
        return MoveOutcome::unchanged(*position);
    }

    let mut sweep = EllipsoidSweep::new(world, radii, options);
    let inv_radii = radii.map(|r| 1.0 / r);

    let start = position.component_mul(&inv_radii);
    let moved = sweep.collide_and_slide(start, displacement.component_mul(&inv_radii));
    let mut iterations = moved.iterations;
    let mut hit = moved.contact;
    let mut end = moved.position;
    let mut falling = false;

    if *gravity != Vec3::zeros() {
        let fallen = sweep.collide_and_slide(end, gravity.component_mul(&inv_radii));
        iterations += fallen.iterations;
        end = fallen.position;
        falling = !fallen.floor;
        if fallen.contact.is_some() {
            hit = fallen.contact;
        }
    }

    MoveOutcome {
        position: end.component_mul(radii),
        falling,
        hit: hit.map(|c| CollisionHit {
            point: c.point.component_mul(radii),
            triangle: c.triangle.scaled(radii),
            host: c.host,
        }),
        iterations,
    }
}

/// Contact in ellipsoid space.
#[derive(Clone, Copy, Debug)]
struct Contact {
    /// Distance travelled before touching, `t * |velocity|`.
    distance: f32,
    point: Vec3,
    triangle: Triangle3,
    host: Option<HostId>,
}

#[derive(Clone, Copy, Debug)]
struct SlideResult {
    position: Vec3,
    /// Last contact of the pass.
    contact: Option<Contact>,
    /// Some contact of the pass was floor-like.
    floor: bool,
    iterations: u32,
}

/// One body's sweep against one world, reusing the candidate buffer across passes.
struct EllipsoidSweep<'a> {
    world: Option<&'a TriangleSelector>,
    radii: Vec3,
    to_ellipsoid: Mat4,
    options: &'a SweepOptions,
    candidates: Vec<(Triangle3, Option<HostId>)>,
}

impl<'a> EllipsoidSweep<'a> {
    fn new(world: Option<&'a TriangleSelector>, radii: &Vec3, options: &'a SweepOptions) -> Self {
        Self {
            world,
            radii: *radii,
            to_ellipsoid: Mat4::new_nonuniform_scaling(&radii.map(|r| 1.0 / r)),
            options,
            candidates: Vec::new(),
        }
    }

    /// Sweep-and-slide in ellipsoid space, bounded by `max_recursion_depth`.
    fn collide_and_slide(&mut self, start: Vec3, velocity: Vec3) -> SlideResult {
        let eps = self.options.sliding_tolerance;
        let mut pos = start;
        let mut vel = velocity;
        let mut result = SlideResult {
            position: start,
            contact: None,
            floor: false,
            iterations: 0,
        };

        // Slide velocities below the tolerance end the loop further down; the
        // requested move is taken however short it is.
        for _ in 0..=self.options.max_recursion_depth {
            if vel == Vec3::zeros() {
                result.position = pos;
                return result;
            }
            result.iterations += 1;

            let Some(contact) = self.nearest_contact(&pos, &vel) else {
                result.position = pos + vel;
                return result;
            };

            // Stop short of the contact so the next step starts outside the surface.
            let v_hat = vel.normalize();
            let destination = pos + vel;
            let mut new_base = pos;
            let mut near_point = contact.point;
            if contact.distance >= eps {
                new_base = pos + v_hat * (contact.distance - eps);
                near_point -= v_hat * eps;
            }

            result.floor |= self.is_floor(&contact.triangle);
            result.contact = Some(contact);

            let Some(slide_normal) = (new_base - near_point).try_normalize(0.0) else {
                result.position = new_base;
                return result;
            };
            let slide_plane = Plane3::from_point_normal(&near_point, &slide_normal);
            let new_destination = slide_plane.project_point(&destination);
            let new_velocity = new_destination - near_point;

            if new_velocity.norm() < eps {
                result.position = new_base;
                return result;
            }
            pos = new_base;
            vel = new_velocity;
        }

        log::trace!(
            "slide did not settle after {} iterations, stepping by the tolerance",
            result.iterations
        );
        result.position = pos + vel.normalize() * eps;
        result
    }

    /// Earliest contact along `vel` among the triangles near the swept volume.
    fn nearest_contact(&mut self, pos: &Vec3, vel: &Vec3) -> Option<Contact> {
        let world = self.world?;

        // Query box in world space; triangles come back in ellipsoid space.
        let from = pos.component_mul(&self.radii);
        let to = (pos + vel).component_mul(&self.radii);
        let swept = Aabb3::new(from, to).inflate(&self.radii);

        self.candidates.clear();
        let candidates = &mut self.candidates;
        world.visit_in_box(
            &swept,
            Some(&self.to_ellipsoid),
            &self.options.filter,
            &mut |tri, host| candidates.push((*tri, host)),
        );

        let speed = vel.norm();
        let mut best: Option<Contact> = None;
        for (triangle, host) in &self.candidates {
            let Some((t, point)) = sweep_unit_sphere(triangle, pos, vel) else {
                continue;
            };
            let distance = t * speed;
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(Contact {
                    distance,
                    point,
                    triangle: *triangle,
                    host: *host,
                });
            }
        }
        best
    }

    /// Mostly horizontal in world space: vertical normal component strictly dominant.
    fn is_floor(&self, ellipsoid_triangle: &Triangle3) -> bool {
        let n = ellipsoid_triangle.scaled(&self.radii).normal();
        n.y.abs() > n.x.abs() && n.y.abs() > n.z.abs()
    }
}

/// Sweep a unit sphere from `base` along `velocity` against one triangle.
///
/// Returns the time of first contact in `[0, 1]` and the contact point. Triangles
/// facing away from the motion are ignored.
pub(crate) fn sweep_unit_sphere(tri: &Triangle3, base: &Vec3, velocity: &Vec3) -> Option<(f32, Vec3)> {
    let plane = tri.plane();
    if plane.is_degenerate() {
        return None;
    }
    let normal_dot_vel = plane.normal.dot(velocity);
    if normal_dot_vel > PARALLEL_EPS {
        return None;
    }

    let signed_dist = plane.distance_to(base);
    let embedded = normal_dot_vel.abs() <= PARALLEL_EPS;
    let t0 = if embedded {
        // Moving along the plane: either inside the unit slab for the whole step or never.
        if signed_dist.abs() >= 1.0 {
            return None;
        }
        0.0
    } else {
        let mut t0 = (-1.0 - signed_dist) / normal_dot_vel;
        let mut t1 = (1.0 - signed_dist) / normal_dot_vel;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > 1.0 || t1 < 0.0 {
            return None;
        }
        t0.clamp(0.0, 1.0)
    };

    if !embedded {
        let on_plane = base - plane.normal + velocity * t0;
        if tri.contains_point(&on_plane) {
            return Some((t0, on_plane));
        }
    }

    // Face missed: the sphere can still touch a vertex or an edge.
    let mut t = 1.0;
    let mut point = None;
    let vel_sq = velocity.norm_squared();

    for p in tri.points() {
        let b = 2.0 * velocity.dot(&(base - p));
        let c = (p - base).norm_squared() - 1.0;
        if let Some(root) = lowest_root(vel_sq, b, c, t) {
            t = root;
            point = Some(p);
        }
    }

    for (p1, p2) in [(tri.a, tri.b), (tri.b, tri.c), (tri.c, tri.a)] {
        let edge = p2 - p1;
        let base_to_vertex = p1 - base;
        let edge_sq = edge.norm_squared();
        let edge_dot_vel = edge.dot(velocity);
        let edge_dot_btv = edge.dot(&base_to_vertex);

        let a = edge_sq * -vel_sq + edge_dot_vel * edge_dot_vel;
        let b = edge_sq * (2.0 * velocity.dot(&base_to_vertex)) - 2.0 * edge_dot_vel * edge_dot_btv;
        let c = edge_sq * (1.0 - base_to_vertex.norm_squared()) + edge_dot_btv * edge_dot_btv;

        if let Some(root) = lowest_root(a, b, c, t) {
            let f = (edge_dot_vel * root - edge_dot_btv) / edge_sq;
            if (0.0..=1.0).contains(&f) {
                t = root;
                point = Some(p1 + edge * f);
            }
        }
    }

    point.map(|p| (t, p))
}

/// Smallest root of `a x² + b x + c` in `(0, max)`.
pub(crate) fn lowest_root(a: f32, b: f32, c: f32, max: f32) -> Option<f32> {
    if a.abs() <= QUADRATIC_EPS {
        return None;
    }
    let det = b * b - 4.0 * a * c;
    if det < 0.0 {
        return None;
    }
    let sqrt_det = det.sqrt();
    let mut r1 = (-b - sqrt_det) / (2.0 * a);
    let mut r2 = (-b + sqrt_det) / (2.0 * a);
    if r1 > r2 {
        std::mem::swap(&mut r1, &mut r2);
    }
    [r1, r2].into_iter().find(|&r| r > 0.0 && r < max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{Host, MeshSelector};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn big_floor() -> Triangle3 {
        Triangle3::new(
            Vec3::new(-1000.0, 0.0, -1000.0),
            Vec3::new(0.0, 0.0, 1000.0),
            Vec3::new(1000.0, 0.0, -1000.0),
        )
    }

    fn world_of(tris: Vec<Triangle3>) -> TriangleSelector {
        MeshSelector::from_triangles(tris, None).into()
    }

    #[test]
    fn lowest_root_picks_smallest_positive_below_max() {
        // (x - 1)(x - 3)
        assert_eq!(lowest_root(1.0, -4.0, 3.0, 10.0), Some(1.0));
        assert_eq!(lowest_root(1.0, -4.0, 3.0, 2.0), Some(1.0));
        assert_eq!(lowest_root(1.0, -4.0, 3.0, 0.5), None);
        // (x + 1)(x - 3): only the positive root counts.
        assert_eq!(lowest_root(1.0, -2.0, -3.0, 10.0), Some(3.0));
        assert_eq!(lowest_root(1.0, 0.0, 1.0, 10.0), None);
        assert_eq!(lowest_root(0.0, 1.0, 1.0, 10.0), None);
    }

    #[test]
    fn sphere_hits_face_at_analytic_time() {
        let base = Vec3::new(0.0, 5.0, 0.0);
        let vel = Vec3::new(0.0, -8.0, 0.0);
        let (t, p) = sweep_unit_sphere(&big_floor(), &base, &vel).unwrap();
        assert_relative_eq!(t, 0.5, epsilon = 1.0e-6);
        assert_relative_eq!(p, Vec3::zeros(), epsilon = 1.0e-5);
    }

    #[test]
    fn sphere_moving_away_or_short_misses() {
        let base = Vec3::new(0.0, 5.0, 0.0);
        assert!(sweep_unit_sphere(&big_floor(), &base, &Vec3::new(0.0, 3.0, 0.0)).is_none());
        assert!(sweep_unit_sphere(&big_floor(), &base, &Vec3::new(0.0, -3.0, 0.0)).is_none());
    }

    #[test]
    fn sphere_touches_vertex_and_edge() {
        let base = Vec3::new(-3.0, 0.5, 0.0);
        let vel = Vec3::new(5.0, 0.0, 0.0);
        let expected_t = (3.0 - 0.75f32.sqrt()) / 5.0;

        let tip = Triangle3::new(Vec3::zeros(), Vec3::new(5.0, 0.0, 5.0), Vec3::new(5.0, 0.0, -5.0));
        let (t, p) = sweep_unit_sphere(&tip, &base, &vel).unwrap();
        assert_relative_eq!(t, expected_t, epsilon = 1.0e-5);
        assert_relative_eq!(p, Vec3::zeros(), epsilon = 1.0e-5);

        let side = Triangle3::new(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, 0.0),
        );
        let (t, p) = sweep_unit_sphere(&side, &base, &vel).unwrap();
        assert_relative_eq!(t, expected_t, epsilon = 1.0e-5);
        assert_relative_eq!(p, Vec3::zeros(), epsilon = 1.0e-5);
    }

    #[test]
    fn grazing_move_slides_along_plane() {
        let world = world_of(vec![big_floor()]);
        for radii in [Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 2.0, 1.0)] {
            let start = Vec3::new(0.0, 1.01 * radii.y, 0.0);
            let requested = Vec3::new(2.0, -radii.y, 0.0);
            let out = resolve_move(
                &start,
                &requested,
                &radii,
                Some(&world),
                &Vec3::zeros(),
                &SweepOptions::default(),
            );
            let moved = out.position - start;
            // Blocked along the normal, free along the plane.
            assert!(moved.y.abs() < 0.011 * radii.y, "{moved:?}");
            assert!(moved.x > 1.9, "{moved:?}");
            // No penetration: the bottom of the ellipsoid stays above the plane.
            assert!(out.position.y - radii.y >= -DEFAULT_SLIDING_TOLERANCE * radii.y);
            assert!(out.hit.is_some());
            assert!(!out.falling);
        }
    }

    #[test]
    fn wall_blocks_head_on_move() {
        // Plane x = 5 facing -X.
        let wall = Triangle3::new(
            Vec3::new(5.0, -100.0, -100.0),
            Vec3::new(5.0, -100.0, 100.0),
            Vec3::new(5.0, 100.0, 0.0),
        );
        assert!(wall.normal().x < -0.99);
        let world = world_of(vec![wall]);
        let out = resolve_move(
            &Vec3::zeros(),
            &Vec3::new(10.0, 0.0, 0.0),
            &Vec3::new(1.0, 1.0, 1.0),
            Some(&world),
            &Vec3::zeros(),
            &SweepOptions::default(),
        );
        assert!(out.position.x <= 4.0 + 1.0e-4);
        assert!(out.position.x > 3.99);
        let hit = out.hit.unwrap();
        assert_relative_eq!(hit.point.x, 5.0, epsilon = 1.0e-3);
    }

    #[test]
    fn degenerate_input_leaves_body_in_place() {
        let world = world_of(vec![big_floor()]);
        let start = Vec3::new(1.0, 2.0, 3.0);
        let opts = SweepOptions::default();
        let g = Vec3::new(0.0, -1.0, 0.0);
        for radii in [Vec3::new(0.0, 1.0, 1.0), Vec3::new(1.0, -1.0, 1.0), Vec3::new(f32::NAN, 1.0, 1.0)] {
            let out = resolve_move(&start, &Vec3::x(), &radii, Some(&world), &g, &opts);
            assert_eq!(out.position, start);
            assert_eq!(out.iterations, 0);
        }
        let out = resolve_move(
            &start,
            &Vec3::new(f32::INFINITY, 0.0, 0.0),
            &Vec3::repeat(1.0),
            Some(&world),
            &g,
            &opts,
        );
        assert_eq!(out.position, start);
    }

    #[test]
    fn empty_or_missing_world_is_permissive() {
        let empty = TriangleSelector::from(crate::selector::CompositeSelector::new());
        let start = Vec3::new(0.0, 10.0, 0.0);
        let d = Vec3::new(3.0, 0.0, -1.0);
        let g = Vec3::new(0.0, -0.5, 0.0);
        for world in [None, Some(&empty)] {
            let out = resolve_move(&start, &d, &Vec3::repeat(1.0), world, &g, &SweepOptions::default());
            assert_relative_eq!(out.position, start + d + g, epsilon = 1.0e-5);
            assert!(out.falling);
            assert!(out.hit.is_none());
        }
    }

    #[test]
    fn move_shorter_than_tolerance_is_not_dropped() {
        let start = Vec3::new(0.0, 10.0, 0.0);
        let d = Vec3::new(0.0004, 0.0, 0.0);
        assert!(d.norm() < DEFAULT_SLIDING_TOLERANCE);
        let out = resolve_move(&start, &d, &Vec3::repeat(1.0), None, &Vec3::zeros(), &SweepOptions::default());
        assert_relative_eq!(out.position, start + d, epsilon = 1.0e-7);
        assert_eq!(out.iterations, 1);

        let still = resolve_move(&start, &Vec3::zeros(), &Vec3::repeat(1.0), None, &Vec3::zeros(), &SweepOptions::default());
        assert_eq!(still.position, start);
        assert_eq!(still.iterations, 0);
    }

    #[test]
    fn tiny_gravity_step_still_finds_the_floor() {
        let world = world_of(vec![big_floor()]);
        // Gap of half the gravity step, itself below the tolerance.
        let start = Vec3::new(0.0, 1.0 + 0.5e-4, 0.0);
        let out = resolve_move(
            &start,
            &Vec3::zeros(),
            &Vec3::repeat(1.0),
            Some(&world),
            &Vec3::new(0.0, -1.0e-4, 0.0),
            &SweepOptions::default(),
        );
        assert!(!out.falling);
        assert!(out.position.y >= 1.0);
    }

    #[test]
    fn zero_gravity_is_never_falling() {
        let out = resolve_move(
            &Vec3::zeros(),
            &Vec3::x(),
            &Vec3::repeat(1.0),
            None,
            &Vec3::zeros(),
            &SweepOptions::default(),
        );
        assert!(!out.falling);
        assert_relative_eq!(out.position, Vec3::x());
    }

    #[test]
    fn excluded_host_does_not_block() {
        let world: TriangleSelector =
            MeshSelector::from_triangles(vec![big_floor()], Some(Host::new(HostId(1)))).into();
        let opts = SweepOptions::default().with_filter(QueryFilter::excluding(HostId(1)));
        let out = resolve_move(
            &Vec3::new(0.0, 2.0, 0.0),
            &Vec3::new(0.0, -5.0, 0.0),
            &Vec3::repeat(1.0),
            Some(&world),
            &Vec3::zeros(),
            &opts,
        );
        assert_relative_eq!(out.position.y, -3.0, epsilon = 1.0e-5);
    }

    #[test]
    fn depth_cap_falls_back_to_epsilon_step() {
        let world = world_of(vec![big_floor()]);
        let opts = SweepOptions {
            max_recursion_depth: 0,
            ..SweepOptions::default()
        };
        let start = Vec3::new(0.0, 1.01, 0.0);
        let out = resolve_move(
            &start,
            &Vec3::new(2.0, -1.0, 0.0),
            &Vec3::repeat(1.0),
            Some(&world),
            &Vec3::zeros(),
            &opts,
        );
        assert_eq!(out.iterations, 1);
        // Stopped near the contact, then one tolerance step along the slide.
        assert!(out.position.x < 0.05, "{:?}", out.position);
        assert!(out.position.y >= 1.0);
    }

    #[test]
    fn wall_is_not_a_floor() {
        let wall = Triangle3::new(
            Vec3::new(5.0, -100.0, -100.0),
            Vec3::new(5.0, -100.0, 100.0),
            Vec3::new(5.0, 100.0, 0.0),
        );
        // Gravity pushes the body sideways into the wall.
        let world = world_of(vec![wall]);
        let out = resolve_move(
            &Vec3::new(3.5, 0.0, 0.0),
            &Vec3::zeros(),
            &Vec3::repeat(1.0),
            Some(&world),
            &Vec3::new(1.0, -1.0, 0.0),
            &SweepOptions::default(),
        );
        assert!(out.hit.is_some());
        assert!(out.falling);
    }

    #[test]
    fn fuzzed_moves_terminate_within_bound() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tris = Vec::new();
        for _ in 0..200 {
            let base = Vec3::new(
                rng.random_range(-20.0..20.0),
                rng.random_range(-20.0..20.0),
                rng.random_range(-20.0..20.0),
            );
            let mut corner = || {
                base + Vec3::new(
                    rng.random_range(-6.0..6.0),
                    rng.random_range(-6.0..6.0),
                    rng.random_range(-6.0..6.0),
                )
            };
            let (a, b, c) = (corner(), corner(), corner());
            tris.push(Triangle3::new(a, b, c));
        }
        let world = world_of(tris);
        let opts = SweepOptions::default();
        let bound = 2 * (opts.max_recursion_depth + 1);

        for _ in 0..500 {
            let start = Vec3::new(
                rng.random_range(-25.0..25.0),
                rng.random_range(-25.0..25.0),
                rng.random_range(-25.0..25.0),
            );
            let d = Vec3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            );
            let radii = Vec3::new(
                rng.random_range(0.2..3.0),
                rng.random_range(0.2..3.0),
                rng.random_range(0.2..3.0),
            );
            let out = resolve_move(&start, &d, &radii, Some(&world), &Vec3::new(0.0, -0.3, 0.0), &opts);
            assert!(out.iterations <= bound);
            assert!(is_finite_vec(&out.position), "{start:?} {d:?} {radii:?}");
        }
    }
}
