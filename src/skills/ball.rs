use super::{contact_distance, direction, Target, ARRIVE_TOLERANCE};
use crate::{
    command::{Action, PlanFallback},
    config::GameplayConfig,
    fsm::{FsmState, Skill, SkillInput},
    geometry::{angle_of, normalize_angle, point, Point, Pose},
    role_assignment::{Capabilities, RoleRequirements},
    world::WorldState,
    Status,
};

/// How far from the ball the approach stops before driving in slowly.
pub const APPROACH_OFFSET: f64 = 0.3;
/// The ball counts as gone from the robot beyond contact distance plus this.
const RELEASE_MARGIN: f64 = 0.15;
/// Time the kicker gets to fire.
pub const KICK_WINDOW: f64 = 0.3;
/// Heading error in radians at which a pivot counts as aimed.
pub const AIM_TOLERANCE: f64 = 0.1;

/// Pose next to the ball on the robot's side, facing the ball.
fn touch_pose(ball: &Point, robot: &Point, distance: f64) -> Pose {
    let outward = direction(ball, robot, point(-1., 0.));
    Pose::at(ball + outward * distance, angle_of(&(-outward)))
}

fn ball_requirements(world: &WorldState, capabilities: Capabilities) -> RoleRequirements {
    RoleRequirements {
        capabilities,
        preferred_position: world.ball_position(),
        ..RoleRequirements::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Approach,
    Capture,
    Completed,
}

impl FsmState for CaptureState {
    const ALL: &'static [Self] = &[
        CaptureState::Approach,
        CaptureState::Capture,
        CaptureState::Completed,
    ];

    fn name(self) -> &'static str {
        match self {
            CaptureState::Approach => "Approach",
            CaptureState::Capture => "Capture",
            CaptureState::Completed => "Completed",
        }
    }
}

/// Drive up to the ball and take it on the dribbler.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Capture;

impl Skill for Capture {
    type State = CaptureState;
    const INITIAL: CaptureState = CaptureState::Approach;

    fn requirements(
        &self,
        _state: CaptureState,
        world: &WorldState,
        _config: &GameplayConfig,
    ) -> RoleRequirements {
        ball_requirements(
            world,
            Capabilities {
                dribbler: true,
                ..Capabilities::default()
            },
        )
    }

    fn transition(&self, state: CaptureState, input: &SkillInput) -> CaptureState {
        let Some(ball) = input.world.ball_position() else {
            return state;
        };
        let dist = (ball - input.robot.position()).norm();
        let contact = contact_distance(input.config);
        match state {
            CaptureState::Approach if dist <= APPROACH_OFFSET + ARRIVE_TOLERANCE => {
                CaptureState::Capture
            }
            CaptureState::Capture if dist <= contact + ARRIVE_TOLERANCE => CaptureState::Completed,
            CaptureState::Capture if dist > APPROACH_OFFSET + 4. * ARRIVE_TOLERANCE => {
                CaptureState::Approach
            }
            state => state,
        }
    }

    fn action(&self, state: CaptureState, input: &SkillInput) -> Option<Action> {
        let Some(ball) = input.world.ball_position() else {
            return Some(Action::Hold { dribble: false });
        };
        let robot = input.robot.position();
        Some(match state {
            CaptureState::Approach => Action::MoveTo {
                target: touch_pose(&ball, &robot, APPROACH_OFFSET),
                dribble: false,
                avoid_ball: true,
                fallback: PlanFallback::StraightLine,
            },
            CaptureState::Capture => Action::MoveTo {
                target: touch_pose(&ball, &robot, contact_distance(input.config)),
                dribble: true,
                avoid_ball: false,
                fallback: PlanFallback::StraightLine,
            },
            CaptureState::Completed => Action::Hold { dribble: true },
        })
    }

    fn status(&self, state: CaptureState) -> Status {
        match state {
            CaptureState::Completed => Status::Success,
            _ => Status::Running,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKickState {
    Capture,
    Aim,
    Kick,
    Completed,
    Failed,
}

impl FsmState for PivotKickState {
    const ALL: &'static [Self] = &[
        PivotKickState::Capture,
        PivotKickState::Aim,
        PivotKickState::Kick,
        PivotKickState::Completed,
        PivotKickState::Failed,
    ];

    fn name(self) -> &'static str {
        match self {
            PivotKickState::Capture => "Capture",
            PivotKickState::Aim => "Aim",
            PivotKickState::Kick => "Kick",
            PivotKickState::Completed => "Completed",
            PivotKickState::Failed => "Failed",
        }
    }
}

/// Take the ball, turn around it towards the target and kick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotKick {
    pub target: Target,
    pub chip: bool,
    pub strength: f64,
}

impl Default for PivotKick {
    fn default() -> Self {
        Self {
            target: Target::TheirGoal,
            chip: false,
            strength: 1.,
        }
    }
}

impl PivotKick {
    fn aim(&self, ball: &Point, input: &SkillInput) -> f64 {
        self.target
            .resolve(input.world, input.config)
            .filter(|t| (t - ball).norm() > 1e-9)
            .map_or(input.robot.pose.heading, |t| angle_of(&(t - ball)))
    }
}

impl Skill for PivotKick {
    type State = PivotKickState;
    const INITIAL: PivotKickState = PivotKickState::Capture;

    fn requirements(
        &self,
        _state: PivotKickState,
        world: &WorldState,
        _config: &GameplayConfig,
    ) -> RoleRequirements {
        ball_requirements(
            world,
            Capabilities {
                dribbler: true,
                kicker: true,
                chipper: self.chip,
            },
        )
    }

    fn transition(&self, state: PivotKickState, input: &SkillInput) -> PivotKickState {
        use PivotKickState as S;

        let ball = input.world.ball_position();
        let contact = contact_distance(input.config);
        let dist = ball.map(|b| (b - input.robot.position()).norm());
        match (state, ball, dist) {
            (S::Completed | S::Failed, _, _) => state,
            (S::Kick, Some(_), Some(dist)) if dist > contact + RELEASE_MARGIN => S::Completed,
            // Either the ball never left or nobody knows where it went
            (S::Kick, _, _) if input.time_in_state >= KICK_WINDOW => S::Failed,
            (S::Kick, _, _) => S::Kick,
            (_, None, _) | (_, _, None) => state,
            (S::Capture, Some(_), Some(dist)) if dist <= contact + ARRIVE_TOLERANCE => S::Aim,
            (S::Capture, _, _) => S::Capture,
            (S::Aim, Some(_), Some(dist)) if dist > contact + RELEASE_MARGIN => S::Capture,
            (S::Aim, Some(ball), Some(_)) => {
                let error = normalize_angle(self.aim(&ball, input) - input.robot.pose.heading);
                if error.abs() <= AIM_TOLERANCE {
                    S::Kick
                } else {
                    S::Aim
                }
            }
        }
    }

    fn action(&self, state: PivotKickState, input: &SkillInput) -> Option<Action> {
        let Some(ball) = input.world.ball_position() else {
            return Some(Action::Hold { dribble: false });
        };
        let contact = contact_distance(input.config);
        Some(match state {
            PivotKickState::Capture => Action::MoveTo {
                target: touch_pose(&ball, &input.robot.position(), contact),
                dribble: true,
                avoid_ball: false,
                fallback: PlanFallback::StraightLine,
            },
            PivotKickState::Aim => {
                let heading = self.aim(&ball, input);
                let behind = point(heading.cos(), heading.sin()) * -contact;
                Action::MoveTo {
                    target: Pose::at(ball + behind, heading),
                    dribble: true,
                    avoid_ball: false,
                    fallback: PlanFallback::StraightLine,
                }
            }
            PivotKickState::Kick => Action::Kick {
                chip: self.chip,
                strength: self.strength,
            },
            PivotKickState::Completed | PivotKickState::Failed => Action::Hold { dribble: false },
        })
    }

    fn status(&self, state: PivotKickState) -> Status {
        match state {
            PivotKickState::Completed => Status::Success,
            PivotKickState::Failed => Status::Failed,
            _ => Status::Running,
        }
    }
}
