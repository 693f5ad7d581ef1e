//! Leaf behaviors that drive a single robot.
//!
//! Every skill except [`Idle`] is a small state machine run through
//! [`SkillNode`](crate::fsm::SkillNode).

mod ball;
mod defense;
mod goalie;
mod movement;

use std::str::FromStr;

pub use self::{
    ball::{Capture, CaptureState, PivotKick, PivotKickState},
    defense::{Defender, DefenderState, Mark, MarkState, Side},
    goalie::{Goalie, GoalieState},
    movement::{HoldPosition, HoldState, Move, MoveState},
};

use crate::{
    config::GameplayConfig,
    geometry::{point, Point},
    world::WorldState,
    BehaviorNode, BehaviorNodeContainer, Context, Status,
};

/// Distance at which a robot counts as arrived.
pub const ARRIVE_TOLERANCE: f64 = 0.05;

/// Where a skill should go or look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Point(Point),
    Ball,
    TheirGoal,
    OurGoal,
    Center,
}

impl Target {
    /// `None` when the target is the ball and the ball is not seen.
    pub fn resolve(&self, world: &WorldState, config: &GameplayConfig) -> Option<Point> {
        match self {
            Target::Point(p) => Some(*p),
            Target::Ball => world.ball_position(),
            Target::TheirGoal => Some(config.field.their_goal()),
            Target::OurGoal => Some(config.field.our_goal()),
            Target::Center => Some(Point::zeros()),
        }
    }
}

impl FromStr for Target {
    type Err = ();

    /// A keyword or a point written as `"x, y"`.
    fn from_str(s: &str) -> Result<Self, ()> {
        match s.trim() {
            "ball" => Ok(Target::Ball),
            "their_goal" => Ok(Target::TheirGoal),
            "our_goal" => Ok(Target::OurGoal),
            "center" => Ok(Target::Center),
            s => {
                let (x, y) = s.split_once(',').ok_or(())?;
                let x: f64 = x.trim().parse().map_err(|_| ())?;
                let y: f64 = y.trim().parse().map_err(|_| ())?;
                if x.is_finite() && y.is_finite() {
                    Ok(Target::Point(point(x, y)))
                } else {
                    Err(())
                }
            }
        }
    }
}

/// Needs no robot and never finishes.
#[derive(Default)]
pub struct Idle;

impl BehaviorNode for Idle {
    fn tick(&mut self, _children: &mut [BehaviorNodeContainer], _ctx: &mut Context) -> Status {
        Status::Running
    }
}

/// Distance between robot and ball centers when they touch.
fn contact_distance(config: &GameplayConfig) -> f64 {
    config.robot_radius + config.ball_radius
}

/// Unit vector from `from` towards `to`, or `fallback` if they coincide.
fn direction(from: &Point, to: &Point, fallback: Point) -> Point {
    let d = to - from;
    let n = d.norm();
    if n > 1e-9 {
        d / n
    } else {
        fallback
    }
}
