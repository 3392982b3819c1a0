//! Player controller state machine.
//!
//! Each fixed step the scene integrates physics first, then calls `update`
//! with the frame's input. `update` reads ground contact from the character's
//! body, writes the body's velocity, and picks the animation. An attack press
//! that passes the gate comes back as an `AttackRequest` which the scene
//! resolves against the container registry before calling
//! `clamp_to_viewport`.
//!
//! Animation completion is a deferred transition: the scene forwards it to
//! `handle_event`, which looks up the `(state, event)` pair in `TRANSITIONS`.

use bloom_core::input::{InputState, Key};
use glam::Vec2;

use crate::animation::{
    AnimationEvent, AnimationPlayer, CLIP_ATTACK, CLIP_IDLE, CLIP_JUMP, CLIP_WALK_LEFT,
    CLIP_WALK_RIGHT,
};
use crate::config::{PlayerConfig, ViewportConfig};
use crate::physics::Body;

const LEFT_KEYS: &[Key] = &[Key::Left, Key::A];
const RIGHT_KEYS: &[Key] = &[Key::Right, Key::D];
const JUMP_KEYS: &[Key] = &[Key::Up, Key::W, Key::Space];
const ATTACK_KEYS: &[Key] = &[Key::X];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Idle,
    WalkLeft,
    WalkRight,
    Jump,
    Attack,
}

impl PlayerState {
    pub const ALL: &'static [PlayerState] = &[
        PlayerState::Idle,
        PlayerState::WalkLeft,
        PlayerState::WalkRight,
        PlayerState::Jump,
        PlayerState::Attack,
    ];

    pub fn clip_name(self) -> &'static str {
        match self {
            Self::Idle => CLIP_IDLE,
            Self::WalkLeft => CLIP_WALK_LEFT,
            Self::WalkRight => CLIP_WALK_RIGHT,
            Self::Jump => CLIP_JUMP,
            Self::Attack => CLIP_ATTACK,
        }
    }

    pub fn from_clip_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.clip_name() == name)
    }

    pub fn clip_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.clip_name()).collect()
    }
}

/// One frame of player intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerInput {
    pub left_held: bool,
    pub right_held: bool,
    /// Edge: true only on the frame a jump key went down.
    pub jump_pressed: bool,
    /// Edge: true only on the frame the attack key went down.
    pub attack_pressed: bool,
}

impl ControllerInput {
    pub fn from_input_state(input: &InputState) -> Self {
        Self {
            left_held: input.any_held(LEFT_KEYS),
            right_held: input.any_held(RIGHT_KEYS),
            jump_pressed: input.any_just_pressed(JUMP_KEYS),
            attack_pressed: input.any_just_pressed(ATTACK_KEYS),
        }
    }

    fn horizontal_held(&self) -> bool {
        self.left_held || self.right_held
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerEvent {
    AnimationComplete(PlayerState),
}

impl ControllerEvent {
    pub fn from_animation(event: &AnimationEvent) -> Option<Self> {
        match event {
            AnimationEvent::Completed(clip) => {
                PlayerState::from_clip_name(clip).map(Self::AnimationComplete)
            }
        }
    }
}

/// Raised when an attack starts; resolved by the scene in the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackRequest {
    pub origin: Vec2,
    pub facing: Facing,
    pub range: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub speed: f32,
    pub jump_velocity: f32,
    pub attack_range: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub viewport_width: f32,
}

impl ControllerConfig {
    pub fn new(player: &PlayerConfig, viewport: &ViewportConfig) -> Self {
        Self {
            speed: player.speed,
            jump_velocity: player.jump_velocity,
            attack_range: player.attack_range,
            margin_left: player.margin_left,
            margin_right: player.margin_right,
            viewport_width: viewport.width,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new(&PlayerConfig::default(), &ViewportConfig::default())
    }
}

type TransitionFn = fn(&mut PlayerController, &mut Body, &ControllerInput, &mut AnimationPlayer);

/// Deferred transitions keyed by (current state, event). Pairs not listed
/// are ignored.
const TRANSITIONS: &[(PlayerState, ControllerEvent, TransitionFn)] = &[(
    PlayerState::Attack,
    ControllerEvent::AnimationComplete(PlayerState::Attack),
    PlayerController::finish_attack,
)];

#[derive(Debug, Clone)]
pub struct PlayerController {
    pub config: ControllerConfig,
    state: PlayerState,
    facing: Facing,
    grounded: bool,
    /// Set on takeoff (or on leaving the ground without jumping), cleared on
    /// landing. Blocks a second jump impulse while airborne.
    jump_latch: bool,
    attacking: bool,
}

impl PlayerController {
    /// Starts airborne-unknown: the first grounded frame counts as a landing.
    pub fn new(config: ControllerConfig, animator: &mut AnimationPlayer) -> Self {
        animator.play(CLIP_IDLE);
        Self {
            config,
            state: PlayerState::Idle,
            facing: Facing::Right,
            grounded: false,
            jump_latch: false,
            attacking: false,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    #[allow(dead_code)]
    pub fn is_jumping(&self) -> bool {
        self.jump_latch
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    /// Movement, landing, jump, airborne, idle and attack gate for one frame.
    pub fn update(
        &mut self,
        body: &mut Body,
        input: ControllerInput,
        animator: &mut AnimationPlayer,
    ) -> Option<AttackRequest> {
        let was_grounded = self.grounded;
        self.grounded = body.is_touching_ground();
        let landed = self.grounded && !was_grounded;

        if self.attacking {
            body.velocity.x = 0.0;
            if landed {
                self.jump_latch = false;
            }
            return None;
        }

        let moving = self.apply_horizontal(body, &input, animator);

        if landed {
            self.jump_latch = false;
            if !moving {
                self.enter(PlayerState::Idle, animator);
            }
        }

        if input.jump_pressed && self.grounded && !self.jump_latch {
            body.velocity.y = self.config.jump_velocity;
            self.enter(PlayerState::Jump, animator);
            self.jump_latch = true;
        }

        // Falling without a jump reuses the jump pose.
        if !self.grounded && !self.jump_latch {
            self.enter(PlayerState::Jump, animator);
            self.jump_latch = true;
        }

        if !moving && self.grounded && !self.jump_latch {
            self.enter(PlayerState::Idle, animator);
        }

        if input.attack_pressed && self.grounded && !self.jump_latch {
            return Some(self.begin_attack(body, animator));
        }
        None
    }

    /// Keep the body inside the horizontal margins. Returns true when clamped.
    pub fn clamp_to_viewport(&self, body: &mut Body) -> bool {
        let x = body.position().x;
        let min_x = self.config.margin_left;
        let max_x = self.config.viewport_width - self.config.margin_right;

        let clamped = if x < min_x {
            min_x
        } else if x > max_x {
            max_x
        } else {
            return false;
        };
        body.set_x(clamped);
        body.velocity.x = 0.0;
        true
    }

    /// Dispatch a deferred event through the transition table. Returns true
    /// when a transition ran.
    pub fn handle_event(
        &mut self,
        event: ControllerEvent,
        body: &mut Body,
        input: &ControllerInput,
        animator: &mut AnimationPlayer,
    ) -> bool {
        let Some(&(_, _, transition)) = TRANSITIONS
            .iter()
            .find(|(state, trigger, _)| *state == self.state && *trigger == event)
        else {
            return false;
        };
        transition(self, body, input, animator);
        true
    }

    fn apply_horizontal(
        &mut self,
        body: &mut Body,
        input: &ControllerInput,
        animator: &mut AnimationPlayer,
    ) -> bool {
        let (direction, facing, walk) = if input.left_held {
            (-1.0, Facing::Left, PlayerState::WalkLeft)
        } else if input.right_held {
            (1.0, Facing::Right, PlayerState::WalkRight)
        } else {
            body.velocity.x = 0.0;
            return false;
        };

        body.velocity.x = direction * self.config.speed;
        self.facing = facing;
        if self.grounded && self.state != walk {
            self.enter(walk, animator);
        }
        true
    }

    fn begin_attack(&mut self, body: &mut Body, animator: &mut AnimationPlayer) -> AttackRequest {
        debug_assert!(!self.attacking, "attack re-entered while active");
        body.velocity.x = 0.0;
        self.attacking = true;
        self.enter(PlayerState::Attack, animator);
        AttackRequest {
            origin: body.position(),
            facing: self.facing,
            range: self.config.attack_range,
        }
    }

    fn finish_attack(
        &mut self,
        _body: &mut Body,
        input: &ControllerInput,
        animator: &mut AnimationPlayer,
    ) {
        if !self.attacking {
            return;
        }
        self.attacking = false;
        if self.grounded && !input.horizontal_held() {
            self.enter(PlayerState::Idle, animator);
        }
    }

    fn enter(&mut self, state: PlayerState, animator: &mut AnimationPlayer) {
        if self.state != state {
            log::debug!("Player {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        animator.play(state.clip_name());
    }
}
