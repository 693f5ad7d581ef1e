//! The per-tick snapshot of everything perception knows.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::MalformedState,
    geometry::{is_finite, Point, Pose},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(pub u8);

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    #[default]
    Blue,
    Yellow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RobotObservation {
    pub id: RobotId,
    pub team: Team,
    pub pose: Pose,
    pub velocity: Point,
    pub angular_velocity: f64,
    /// False when vision lost the robot or the radio reports it unresponsive.
    pub visible: bool,
}

impl RobotObservation {
    pub fn new(id: u8, team: Team, pose: Pose) -> Self {
        Self {
            id: RobotId(id),
            team,
            pose,
            velocity: Point::zeros(),
            angular_velocity: 0.,
            visible: true,
        }
    }

    pub fn position(&self) -> Point {
        self.pose.position
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallObservation {
    pub position: Point,
    pub velocity: Point,
    /// 0 means the filter has no estimate left.
    pub confidence: f64,
}

impl BallObservation {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            velocity: Point::zeros(),
            confidence: 1.,
        }
    }
}

macro_rules! keyword_enum {
    ($name:ident { $($variant:ident => $word:literal),* $(,)? }) => {
        impl FromStr for $name {
            type Err = ();
            fn from_str(s: &str) -> Result<Self, ()> {
                match s {
                    $($word => Ok(Self::$variant),)*
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$variant => $word,)*
                })
            }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Halt,
    Stop,
    /// Robots may position themselves for a restart, but not touch the ball.
    Setup,
    /// The restart may be taken.
    Ready,
    Playing,
}

keyword_enum!(Stage {
    Halt => "halt",
    Stop => "stop",
    Setup => "setup",
    Ready => "ready",
    Playing => "playing",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Restart {
    #[default]
    None,
    Kickoff,
    FreeKick,
    CornerKick,
    GoalKick,
    Penalty,
}

keyword_enum!(Restart {
    None => "none",
    Kickoff => "kickoff",
    FreeKick => "free_kick",
    CornerKick => "corner_kick",
    GoalKick => "goal_kick",
    Penalty => "penalty",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Possession {
    Ours,
    Theirs,
    #[default]
    Neutral,
}

keyword_enum!(Possession {
    Ours => "ours",
    Theirs => "theirs",
    Neutral => "neutral",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GameState {
    pub stage: Stage,
    pub restart: Restart,
    /// Who owns the restart or the ball.
    pub possession: Possession,
    /// Goalie designated through the referee, if any.
    pub our_goalie: Option<RobotId>,
}

impl GameState {
    pub fn playing() -> Self {
        Self {
            stage: Stage::Playing,
            ..Self::default()
        }
    }
}

/// Snapshot of the world for one tick. Coordinates are normalized so that our team
/// always attacks towards +x.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
    pub timestamp: f64,
    pub our_team: Team,
    pub robots: Vec<RobotObservation>,
    pub ball: Option<BallObservation>,
    pub game: GameState,
}

impl WorldState {
    pub fn new(timestamp: f64, our_team: Team) -> Self {
        Self {
            timestamp,
            our_team,
            robots: vec![],
            ball: None,
            game: GameState::default(),
        }
    }

    pub fn with_robot(mut self, robot: RobotObservation) -> Self {
        self.robots.push(robot);
        self
    }

    pub fn with_ball(mut self, ball: BallObservation) -> Self {
        self.ball = Some(ball);
        self
    }

    pub fn with_game(mut self, game: GameState) -> Self {
        self.game = game;
        self
    }

    pub fn our_robots(&self) -> impl Iterator<Item = &RobotObservation> {
        let team = self.our_team;
        self.robots.iter().filter(move |r| r.team == team)
    }

    pub fn their_robots(&self) -> impl Iterator<Item = &RobotObservation> {
        let team = self.our_team;
        self.robots.iter().filter(move |r| r.team != team)
    }

    /// One of our robots by id.
    pub fn robot(&self, id: RobotId) -> Option<&RobotObservation> {
        self.our_robots().find(|r| r.id == id)
    }

    pub fn robot_mut(&mut self, id: RobotId) -> Option<&mut RobotObservation> {
        let team = self.our_team;
        self.robots.iter_mut().find(|r| r.team == team && r.id == id)
    }

    /// The ball, unless the filter lost it.
    pub fn ball(&self) -> Option<&BallObservation> {
        self.ball.as_ref().filter(|b| b.confidence > 0.)
    }

    pub fn ball_position(&self) -> Option<Point> {
        self.ball().map(|b| b.position)
    }

    /// Copy of the snapshot with every malformed entry dropped, plus what was dropped.
    pub fn sanitized(&self) -> (WorldState, Vec<MalformedState>) {
        let mut issues = vec![];
        let mut clean = self.clone();
        if !clean.timestamp.is_finite() {
            issues.push(MalformedState::NonFiniteTimestamp);
            clean.timestamp = 0.;
        }

        let mut seen = BTreeSet::new();
        clean.robots.retain(|r| {
            let finite = r.pose.is_finite()
                && is_finite(&r.velocity)
                && r.angular_velocity.is_finite();
            if !finite {
                issues.push(MalformedState::NonFiniteRobot(r.id));
                return false;
            }
            if !seen.insert((r.team == self.our_team, r.id)) {
                issues.push(MalformedState::DuplicateRobot(r.id));
                return false;
            }
            true
        });

        if let Some(ball) = &clean.ball {
            if !is_finite(&ball.position)
                || !is_finite(&ball.velocity)
                || !ball.confidence.is_finite()
            {
                issues.push(MalformedState::NonFiniteBall);
                clean.ball = None;
            }
        }
        (clean, issues)
    }
}
