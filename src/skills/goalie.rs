use super::direction;
use crate::{
    command::Action,
    config::GameplayConfig,
    fsm::{FsmState, Skill, SkillInput},
    geometry::{angle_of, point, Point, Pose},
    role_assignment::RoleRequirements,
    world::WorldState,
    Status,
};

/// Distance from the goal center the goalie keeps while blocking.
const BLOCK_RADIUS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalieState {
    Home,
    Block,
}

impl FsmState for GoalieState {
    const ALL: &'static [Self] = &[GoalieState::Home, GoalieState::Block];

    fn name(self) -> &'static str {
        match self {
            GoalieState::Home => "Home",
            GoalieState::Block => "Block",
        }
    }
}

/// Guard our goal. Takes the robot the referee designated as goalie when there is one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Goalie;

impl Goalie {
    fn home(config: &GameplayConfig) -> Point {
        config.field.our_goal() + point(config.robot_radius + 0.05, 0.)
    }

    /// Between the ball and the goal center, inside the goal mouth.
    fn block(ball: &Point, config: &GameplayConfig) -> Point {
        let goal = config.field.our_goal();
        let spot = goal + direction(&goal, ball, point(1., 0.)) * BLOCK_RADIUS;
        let half_mouth = config.field.goal_width / 2.;
        point(
            spot.x.max(goal.x + config.robot_radius),
            spot.y.clamp(-half_mouth, half_mouth),
        )
    }
}

impl Skill for Goalie {
    type State = GoalieState;
    const INITIAL: GoalieState = GoalieState::Home;

    fn requirements(
        &self,
        _state: GoalieState,
        world: &WorldState,
        config: &GameplayConfig,
    ) -> RoleRequirements {
        RoleRequirements {
            preferred_position: Some(Self::home(config)),
            required_robot: world.game.our_goalie,
            ..RoleRequirements::default()
        }
    }

    fn transition(&self, _state: GoalieState, input: &SkillInput) -> GoalieState {
        match input.world.ball_position() {
            Some(ball) if ball.x < 0. => GoalieState::Block,
            _ => GoalieState::Home,
        }
    }

    fn action(&self, state: GoalieState, input: &SkillInput) -> Option<Action> {
        let ball = input.world.ball_position();
        let spot = match (state, ball) {
            (GoalieState::Block, Some(ball)) => Self::block(&ball, input.config),
            _ => Self::home(input.config),
        };
        let heading = ball.map_or(0., |b| angle_of(&(b - spot)));
        Some(Action::move_to(Pose::at(spot, heading)))
    }

    fn status(&self, _state: GoalieState) -> Status {
        Status::Running
    }
}
