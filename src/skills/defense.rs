use std::str::FromStr;

use super::direction;
use crate::{
    command::Action,
    config::GameplayConfig,
    fsm::{FsmState, Skill, SkillInput},
    geometry::{angle_of, point, Point, Pose},
    role_assignment::RoleRequirements,
    world::{RobotObservation, WorldState},
    Status,
};

/// Gap left between two defenders standing shoulder to shoulder.
const DEFENDER_GAP: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    Searching,
    Marking,
}

impl FsmState for MarkState {
    const ALL: &'static [Self] = &[MarkState::Searching, MarkState::Marking];

    fn name(self) -> &'static str {
        match self {
            MarkState::Searching => "Searching",
            MarkState::Marking => "Marking",
        }
    }
}

/// Shadow an opponent on its way to our goal.
///
/// Opponents are ranked by their distance to our goal, nearest first; `rank` picks one
/// of them so that several markers can share the work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub rank: usize,
    /// How far in front of the opponent to stand.
    pub distance: f64,
}

impl Default for Mark {
    fn default() -> Self {
        Self {
            rank: 0,
            distance: 0.3,
        }
    }
}

impl Mark {
    fn opponent<'w>(
        &self,
        world: &'w WorldState,
        config: &GameplayConfig,
    ) -> Option<&'w RobotObservation> {
        let goal = config.field.our_goal();
        let mut opponents: Vec<_> = world.their_robots().filter(|r| r.visible).collect();
        opponents.sort_by(|a, b| {
            let da = (a.position() - goal).norm();
            let db = (b.position() - goal).norm();
            da.total_cmp(&db).then_with(|| a.id.cmp(&b.id))
        });
        opponents.get(self.rank).copied()
    }

    /// On the line from the opponent to our goal, facing the opponent.
    fn spot(&self, world: &WorldState, config: &GameplayConfig) -> Option<Pose> {
        let opponent = self.opponent(world, config)?.position();
        let goal = config.field.our_goal();
        let towards_goal = direction(&opponent, &goal, point(-1., 0.));
        let spot = config.field.clamp(&(opponent + towards_goal * self.distance));
        Some(Pose::at(spot, angle_of(&(opponent - spot))))
    }
}

impl Skill for Mark {
    type State = MarkState;
    const INITIAL: MarkState = MarkState::Searching;

    fn requirements(
        &self,
        _state: MarkState,
        world: &WorldState,
        config: &GameplayConfig,
    ) -> RoleRequirements {
        RoleRequirements {
            preferred_position: self.spot(world, config).map(|pose| pose.position),
            ..RoleRequirements::default()
        }
    }

    fn transition(&self, _state: MarkState, input: &SkillInput) -> MarkState {
        if self.opponent(input.world, input.config).is_some() {
            MarkState::Marking
        } else {
            MarkState::Searching
        }
    }

    fn action(&self, state: MarkState, input: &SkillInput) -> Option<Action> {
        match (state, self.spot(input.world, input.config)) {
            (MarkState::Marking, Some(pose)) => Some(Action::move_to(pose)),
            _ => Some(Action::Hold { dribble: false }),
        }
    }

    fn status(&self, _state: MarkState) -> Status {
        Status::Running
    }
}

/// Which shoulder of the goal-to-ball line a defender takes, seen from our goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    Left,
    #[default]
    Center,
    Right,
}

impl FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "left" => Ok(Side::Left),
            "center" => Ok(Side::Center),
            "right" => Ok(Side::Right),
            _ => Err(()),
        }
    }
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Left => 1.,
            Side::Center => 0.,
            Side::Right => -1.,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefenderState {
    Home,
    Guard,
}

impl FsmState for DefenderState {
    const ALL: &'static [Self] = &[DefenderState::Home, DefenderState::Guard];

    fn name(self) -> &'static str {
        match self {
            DefenderState::Home => "Home",
            DefenderState::Guard => "Guard",
        }
    }
}

/// Stand on a circle around our goal between the goal and the ball. Defenders on
/// different sides line up next to each other to form a wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defender {
    pub side: Side,
    /// Distance from our goal center.
    pub radius: f64,
}

impl Default for Defender {
    fn default() -> Self {
        Self {
            side: Side::Center,
            radius: 1.2,
        }
    }
}

impl Defender {
    fn spot(&self, ball: Option<Point>, config: &GameplayConfig) -> Pose {
        let goal = config.field.our_goal();
        let out = ball.map_or(point(1., 0.), |ball| direction(&goal, &ball, point(1., 0.)));
        let across = point(-out.y, out.x);
        let offset = self.side.sign() * (2. * config.robot_radius + DEFENDER_GAP);
        let spot = goal + out * self.radius + across * offset;
        let spot = config.field.clamp(&point(spot.x.max(goal.x + config.robot_radius), spot.y));
        let heading = ball
            .filter(|ball| (ball - spot).norm() > 1e-9)
            .map_or(0., |ball| angle_of(&(ball - spot)));
        Pose::at(spot, heading)
    }
}

impl Skill for Defender {
    type State = DefenderState;
    const INITIAL: DefenderState = DefenderState::Home;

    fn requirements(
        &self,
        _state: DefenderState,
        world: &WorldState,
        config: &GameplayConfig,
    ) -> RoleRequirements {
        RoleRequirements {
            preferred_position: Some(self.spot(world.ball_position(), config).position),
            ..RoleRequirements::default()
        }
    }

    fn transition(&self, _state: DefenderState, input: &SkillInput) -> DefenderState {
        match input.world.ball_position() {
            Some(_) => DefenderState::Guard,
            None => DefenderState::Home,
        }
    }

    fn action(&self, state: DefenderState, input: &SkillInput) -> Option<Action> {
        let ball = match state {
            DefenderState::Guard => input.world.ball_position(),
            DefenderState::Home => None,
        };
        Some(Action::move_to(self.spot(ball, input.config)))
    }

    fn status(&self, _state: DefenderState) -> Status {
        Status::Running
    }
}
