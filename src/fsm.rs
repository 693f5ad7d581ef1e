//! Finite state machines for leaf behaviors.
//!
//! A skill lists its states in an enum implementing [`FsmState`] and describes its
//! behavior through the [`Skill`] trait: a total transition function, the action to
//! take in each state and the status each state maps to. [`SkillNode`] turns a skill
//! into a [`BehaviorNode`] bound to a role.

use std::fmt::Debug;

use crate::{
    command::Action,
    config::GameplayConfig,
    role_assignment::{RoleId, RoleRequest, RoleRequirements},
    world::{RobotObservation, WorldState},
    BehaviorNode, BehaviorNodeContainer, Context, NodeKind, RoleBinding, Status,
};

pub trait FsmState: Copy + Eq + Debug + 'static {
    /// Every state, so tests can check that transitions are total.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
}

/// Current state plus the world time it was entered at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateMachine<S> {
    initial: S,
    state: S,
    entered_at: Option<f64>,
}

impl<S: FsmState> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            state: initial,
            entered_at: None,
        }
    }

    pub fn state(&self) -> S {
        self.state
    }

    /// Start the clock of the current state if it was not running yet.
    pub fn start(&mut self, now: f64) {
        if self.entered_at.is_none() {
            self.entered_at = Some(now);
        }
    }

    /// Returns whether the state changed.
    pub fn set(&mut self, state: S, now: f64) -> bool {
        if state == self.state && self.entered_at.is_some() {
            return false;
        }
        log::trace!("{} -> {}", self.state.name(), state.name());
        self.state = state;
        self.entered_at = Some(now);
        true
    }

    pub fn time_in_state(&self, now: f64) -> f64 {
        self.entered_at.map_or(0., |t| (now - t).max(0.))
    }

    pub fn reset(&mut self) {
        self.state = self.initial;
        self.entered_at = None;
    }
}

/// What a skill gets to see when it is bound to a robot.
#[derive(Debug, Clone, Copy)]
pub struct SkillInput<'a> {
    pub world: &'a WorldState,
    pub config: &'a GameplayConfig,
    pub robot: &'a RobotObservation,
    pub time_in_state: f64,
    /// Planning failures in a row for this robot.
    pub plan_failures: u32,
}

pub trait Skill: 'static {
    type State: FsmState;
    const INITIAL: Self::State;

    fn requirements(
        &self,
        state: Self::State,
        world: &WorldState,
        config: &GameplayConfig,
    ) -> RoleRequirements;

    fn transition(&self, state: Self::State, input: &SkillInput) -> Self::State;

    fn action(&self, state: Self::State, input: &SkillInput) -> Option<Action>;

    fn status(&self, state: Self::State) -> Status;
}

/// How a skill node asks for its robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub id: RoleId,
    pub priority: u8,
    pub mandatory: bool,
    pub sticky: bool,
}

impl RoleSpec {
    pub fn new(id: impl Into<RoleId>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            mandatory: false,
            sticky: true,
        }
    }
}

pub struct SkillNode<S: Skill> {
    skill: S,
    role: RoleSpec,
    machine: StateMachine<S::State>,
}

impl<S: Skill> SkillNode<S> {
    pub fn new(skill: S, role: RoleSpec) -> Self {
        Self {
            skill,
            role,
            machine: StateMachine::new(S::INITIAL),
        }
    }

    pub fn state(&self) -> S::State {
        self.machine.state()
    }

    pub fn skill(&self) -> &S {
        &self.skill
    }
}

impl<S: Skill> BehaviorNode for SkillNode<S> {
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn tick(&mut self, _children: &mut [BehaviorNodeContainer], ctx: &mut Context) -> Status {
        let robot = match ctx.binding(&self.role.id) {
            RoleBinding::Assigned(robot) => robot,
            RoleBinding::Infeasible(_) if self.role.mandatory => return Status::Failed,
            // No robot this tick; try again in the next one
            _ => return Status::Running,
        };

        let world = ctx.world();
        let now = world.timestamp;
        self.machine.start(now);
        let mut input = SkillInput {
            world,
            config: ctx.config(),
            robot,
            time_in_state: self.machine.time_in_state(now),
            plan_failures: ctx.plan_failures(robot.id),
        };

        let next = self.skill.transition(self.machine.state(), &input);
        if self.machine.set(next, now) {
            input.time_in_state = 0.;
        }
        if let Some(action) = self.skill.action(next, &input) {
            ctx.act(robot.id, action);
        }
        self.skill.status(next)
    }

    fn role_request(&self, world: &WorldState, config: &GameplayConfig) -> Option<RoleRequest> {
        let mut requirements = self
            .skill
            .requirements(self.machine.state(), world, config);
        requirements.priority = self.role.priority;
        requirements.mandatory = self.role.mandatory;
        requirements.sticky = self.role.sticky;
        Some(RoleRequest::new(self.role.id.clone(), requirements))
    }

    fn reset(&mut self) {
        self.machine.reset();
    }

    fn state_name(&self) -> &'static str {
        self.machine.state().name()
    }
}

#[cfg(test)]
mod test;
