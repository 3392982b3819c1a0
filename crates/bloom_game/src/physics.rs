//! Arcade physics: velocity-integrated kinematic bodies resolved against
//! immovable static bodies.
//!
//! Screen space, +y points down. The core algorithm is **axis-separable
//! move-and-slide**: resolve X movement first against the static bodies, then
//! resolve Y using the already-corrected X position. This prevents diagonal
//! tunneling and lets a body slide along the top of a row of ground tiles
//! without catching on the seams between them.
//!
//! Kinematic bodies only collide with static bodies on layers they were
//! registered against via `add_collider`.

use glam::Vec2;

use crate::arena::{Arena, Handle};

/// Layer bit carried by ground tiles.
pub const LAYER_GROUND: u32 = 1 << 0;

/// Overlap tolerance. Bodies resting exactly on a surface are not overlapping.
const SKIN: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            center: min + half,
            half,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    #[allow(dead_code)]
    pub fn size(&self) -> Vec2 {
        self.half * 2.0
    }

    fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x - SKIN
            && a_max.x > b_min.x + SKIN
            && a_min.y < b_max.y - SKIN
            && a_max.y > b_min.y + SKIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Kinematic,
    Static,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub kind: BodyKind,
    pub aabb: Aabb,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    /// Layers this body belongs to (static bodies).
    pub layers: u32,
    /// Layers this body resolves against (kinematic bodies).
    pub collides_with: u32,
    /// Contacts with static bodies from the last step.
    pub touching: ContactState,
    /// Contacts with the world bounds from the last step.
    #[allow(dead_code)]
    pub blocked_by_bounds: ContactState,
}

impl Body {
    pub fn position(&self) -> Vec2 {
        self.aabb.center
    }

    pub fn set_position(&mut self, center: Vec2) {
        self.aabb.center = center;
    }

    pub fn set_x(&mut self, x: f32) {
        self.aabb.center.x = x;
    }

    pub fn is_touching_ground(&self) -> bool {
        self.touching.down
    }

    #[allow(dead_code)]
    pub fn is_immovable(&self) -> bool {
        self.kind == BodyKind::Static
    }

    #[allow(dead_code)]
    pub fn allows_gravity(&self) -> bool {
        self.kind == BodyKind::Kinematic && self.gravity_scale != 0.0
    }
}

pub type BodyHandle = Handle<Body>;

#[derive(Debug, Clone, Copy)]
struct CollisionMoveResult {
    center: Vec2,
    blocked_left: bool,
    blocked_right: bool,
    blocked_up: bool,
    blocked_down: bool,
}

pub struct PhysicsWorld {
    pub gravity: f32,
    pub bounds: Option<Aabb>,
    bodies: Arena<Body>,
    /// Static colliders and their layers, appended on creation. Static bodies
    /// never move, so the copy stays valid until `clear`.
    statics: Vec<(Aabb, u32)>,
}

impl PhysicsWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            bounds: None,
            bodies: Arena::new(),
            statics: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn create_kinematic_body(&mut self, center: Vec2, half_extents: Vec2) -> BodyHandle {
        self.bodies.insert(Body {
            kind: BodyKind::Kinematic,
            aabb: Aabb::from_center(center, half_extents),
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            layers: 0,
            collides_with: 0,
            touching: ContactState::default(),
            blocked_by_bounds: ContactState::default(),
        })
    }

    /// Immovable, gravity-exempt collider covering `min..min + size`.
    pub fn create_static_body(&mut self, min: Vec2, size: Vec2, layers: u32) -> BodyHandle {
        let aabb = Aabb::from_min_size(min, size);
        self.statics.push((aabb, layers));
        self.bodies.insert(Body {
            kind: BodyKind::Static,
            aabb,
            velocity: Vec2::ZERO,
            gravity_scale: 0.0,
            layers,
            collides_with: 0,
            touching: ContactState::default(),
            blocked_by_bounds: ContactState::default(),
        })
    }

    /// Register collisions between `body` and every static body on `layers`.
    pub fn add_collider(&mut self, body: BodyHandle, layers: u32) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.collides_with |= layers;
        }
    }

    #[allow(dead_code)]
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Kinematic bodies only; static bodies cannot be moved once created.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies
            .get_mut(handle)
            .filter(|body| body.kind == BodyKind::Kinematic)
    }

    pub fn set_gravity_scale(&mut self, handle: BodyHandle, scale: f32) {
        if let Some(body) = self.body_mut(handle) {
            body.gravity_scale = scale;
        }
    }

    #[allow(dead_code)]
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.velocity = velocity;
        }
    }

    #[allow(dead_code)]
    pub fn is_touching_ground(&self, handle: BodyHandle) -> bool {
        self.bodies
            .get(handle)
            .is_some_and(|body| body.is_touching_ground())
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Integrate every kinematic body by `dt` seconds and refresh contacts.
    pub fn step(&mut self, dt: f32) {
        let statics = &self.statics;
        for (_, body) in self.bodies.iter_mut() {
            if body.kind != BodyKind::Kinematic {
                continue;
            }

            body.velocity.y += self.gravity * body.gravity_scale * dt;

            let mask = body.collides_with;
            let solids = statics
                .iter()
                .filter(move |(_, layers)| layers & mask != 0)
                .map(|(aabb, _)| aabb);
            let result = move_and_collide(body.aabb, body.velocity * dt, solids);
            apply_collision_result(body, result);

            if let Some(bounds) = self.bounds {
                keep_within_bounds(body, &bounds);
            }
        }
    }

    /// Release every body. Returns the number released.
    pub fn clear(&mut self) -> usize {
        self.statics.clear();
        self.bodies.clear()
    }
}

fn move_and_collide<'a>(
    aabb: Aabb,
    delta: Vec2,
    solids: impl Iterator<Item = &'a Aabb> + Clone,
) -> CollisionMoveResult {
    const EPS: f32 = 0.0001;
    let start = aabb.center;
    let half = aabb.half;

    let x = resolve_axis_x(start, half, delta.x, solids.clone());
    let collided_x = (x - (start.x + delta.x)).abs() > EPS;

    let y = resolve_axis_y(Vec2::new(x, start.y), half, delta.y, solids);
    let collided_y = (y - (start.y + delta.y)).abs() > EPS;

    CollisionMoveResult {
        center: Vec2::new(x, y),
        blocked_left: collided_x && delta.x < 0.0,
        blocked_right: collided_x && delta.x > 0.0,
        blocked_up: collided_y && delta.y < 0.0,
        blocked_down: collided_y && delta.y > 0.0,
    }
}

fn resolve_axis_x<'a>(
    start: Vec2,
    half: Vec2,
    dx: f32,
    solids: impl Iterator<Item = &'a Aabb>,
) -> f32 {
    if dx == 0.0 {
        return start.x;
    }

    let mut candidate = start.x + dx;
    let probe = Aabb::from_center(Vec2::new(candidate, start.y), half);
    for solid in solids.filter(|solid| probe.overlaps(solid)) {
        if dx > 0.0 {
            candidate = candidate.min(solid.min().x - half.x);
        } else {
            candidate = candidate.max(solid.max().x + half.x);
        }
    }

    // Guardrail: never push opposite the direction of travel.
    if dx > 0.0 {
        candidate.max(start.x)
    } else {
        candidate.min(start.x)
    }
}

fn resolve_axis_y<'a>(
    start: Vec2,
    half: Vec2,
    dy: f32,
    solids: impl Iterator<Item = &'a Aabb>,
) -> f32 {
    if dy == 0.0 {
        return start.y;
    }

    let mut candidate = start.y + dy;
    let probe = Aabb::from_center(Vec2::new(start.x, candidate), half);
    for solid in solids.filter(|solid| probe.overlaps(solid)) {
        if dy > 0.0 {
            candidate = candidate.min(solid.min().y - half.y);
        } else {
            candidate = candidate.max(solid.max().y + half.y);
        }
    }

    // Guardrail: never push opposite the direction of travel.
    if dy > 0.0 {
        candidate.max(start.y)
    } else {
        candidate.min(start.y)
    }
}

fn apply_collision_result(body: &mut Body, result: CollisionMoveResult) {
    body.set_position(result.center);
    body.touching = ContactState {
        left: result.blocked_left,
        right: result.blocked_right,
        up: result.blocked_up,
        down: result.blocked_down,
    };

    if (result.blocked_left && body.velocity.x < 0.0)
        || (result.blocked_right && body.velocity.x > 0.0)
    {
        body.velocity.x = 0.0;
    }
    // Ground contact comes from blocked downward motion, not y heuristics.
    if (result.blocked_down && body.velocity.y > 0.0)
        || (result.blocked_up && body.velocity.y < 0.0)
    {
        body.velocity.y = 0.0;
    }
}

fn keep_within_bounds(body: &mut Body, bounds: &Aabb) {
    let half = body.aabb.half;
    let mut center = body.position();
    let mut blocked = ContactState::default();

    if center.x - half.x < bounds.min().x {
        center.x = bounds.min().x + half.x;
        blocked.left = true;
    } else if center.x + half.x > bounds.max().x {
        center.x = bounds.max().x - half.x;
        blocked.right = true;
    }
    if center.y - half.y < bounds.min().y {
        center.y = bounds.min().y + half.y;
        blocked.up = true;
    } else if center.y + half.y > bounds.max().y {
        center.y = bounds.max().y - half.y;
        blocked.down = true;
    }

    if blocked.left || blocked.right {
        body.velocity.x = 0.0;
    }
    if blocked.up || blocked.down {
        body.velocity.y = 0.0;
    }
    body.set_position(center);
    body.blocked_by_bounds = blocked;
}
