use super::{Target, ARRIVE_TOLERANCE};
use crate::{
    command::{Action, PlanFallback},
    config::GameplayConfig,
    fsm::{FsmState, Skill, SkillInput},
    geometry::{angle_of, Point, Pose},
    role_assignment::RoleRequirements,
    world::WorldState,
    Status,
};

fn heading_at(goal: &Point, face: Option<Target>, input: &SkillInput) -> f64 {
    face.and_then(|f| f.resolve(input.world, input.config))
        .filter(|f| (f - goal).norm() > 1e-9)
        .map_or(input.robot.pose.heading, |f| angle_of(&(f - goal)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Moving,
    Holding,
}

impl FsmState for HoldState {
    const ALL: &'static [Self] = &[HoldState::Moving, HoldState::Holding];

    fn name(self) -> &'static str {
        match self {
            HoldState::Moving => "Moving",
            HoldState::Holding => "Holding",
        }
    }
}

/// Keep a robot at a spot for as long as the node runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldPosition {
    pub at: Target,
    pub face: Option<Target>,
}

impl Skill for HoldPosition {
    type State = HoldState;
    const INITIAL: HoldState = HoldState::Moving;

    fn requirements(
        &self,
        _state: HoldState,
        world: &WorldState,
        config: &GameplayConfig,
    ) -> RoleRequirements {
        RoleRequirements {
            preferred_position: self.at.resolve(world, config),
            ..RoleRequirements::default()
        }
    }

    fn transition(&self, state: HoldState, input: &SkillInput) -> HoldState {
        let Some(goal) = self.at.resolve(input.world, input.config) else {
            return state;
        };
        let dist = (input.robot.position() - goal).norm();
        match state {
            HoldState::Moving if dist <= ARRIVE_TOLERANCE => HoldState::Holding,
            // Some slack so the robot does not flip between the two at the border
            HoldState::Holding if dist > 2. * ARRIVE_TOLERANCE => HoldState::Moving,
            state => state,
        }
    }

    fn action(&self, state: HoldState, input: &SkillInput) -> Option<Action> {
        let Some(goal) = self.at.resolve(input.world, input.config) else {
            return Some(Action::Hold { dribble: false });
        };
        Some(match state {
            HoldState::Moving => {
                Action::move_to(Pose::at(goal, heading_at(&goal, self.face, input)))
            }
            HoldState::Holding => Action::Hold { dribble: false },
        })
    }

    fn status(&self, _state: HoldState) -> Status {
        Status::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveState {
    Moving,
    Arrived,
    Failed,
}

impl FsmState for MoveState {
    const ALL: &'static [Self] = &[MoveState::Moving, MoveState::Arrived, MoveState::Failed];

    fn name(self) -> &'static str {
        match self {
            MoveState::Moving => "Moving",
            MoveState::Arrived => "Arrived",
            MoveState::Failed => "Failed",
        }
    }
}

/// Drive to a target once. Succeeds on arrival, fails when the planner keeps failing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub to: Target,
    pub face: Option<Target>,
    pub tolerance: f64,
    pub max_failures: u32,
    pub fallback: PlanFallback,
}

impl Move {
    pub fn new(to: Target) -> Self {
        Self {
            to,
            face: None,
            tolerance: ARRIVE_TOLERANCE,
            max_failures: 3,
            fallback: PlanFallback::default(),
        }
    }
}

impl Skill for Move {
    type State = MoveState;
    const INITIAL: MoveState = MoveState::Moving;

    fn requirements(
        &self,
        _state: MoveState,
        world: &WorldState,
        config: &GameplayConfig,
    ) -> RoleRequirements {
        RoleRequirements {
            preferred_position: self.to.resolve(world, config),
            ..RoleRequirements::default()
        }
    }

    fn transition(&self, state: MoveState, input: &SkillInput) -> MoveState {
        match state {
            MoveState::Moving => {
                if input.plan_failures >= self.max_failures {
                    return MoveState::Failed;
                }
                match self.to.resolve(input.world, input.config) {
                    Some(goal) if (input.robot.position() - goal).norm() <= self.tolerance => {
                        MoveState::Arrived
                    }
                    _ => MoveState::Moving,
                }
            }
            MoveState::Arrived | MoveState::Failed => state,
        }
    }

    fn action(&self, state: MoveState, input: &SkillInput) -> Option<Action> {
        match (state, self.to.resolve(input.world, input.config)) {
            (MoveState::Moving, Some(goal)) => Some(Action::MoveTo {
                target: Pose::at(goal, heading_at(&goal, self.face, input)),
                dribble: false,
                avoid_ball: true,
                fallback: self.fallback,
            }),
            _ => Some(Action::Hold { dribble: false }),
        }
    }

    fn status(&self, state: MoveState) -> Status {
        match state {
            MoveState::Moving => Status::Running,
            MoveState::Arrived => Status::Success,
            MoveState::Failed => Status::Failed,
        }
    }
}
