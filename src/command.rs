use crate::{geometry::Pose, planning::Path};

/// What to do when no path to a [`Action::MoveTo`] target can be planned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanFallback {
    /// Drive straight at the target and let the low-level controller deal with it.
    #[default]
    StraightLine,
    /// Plan again with only the bare robot radius around obstacles.
    Relaxed,
    Hold,
}

/// What a skill wants its robot to do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    MoveTo {
        target: Pose,
        dribble: bool,
        /// Treat the ball as an obstacle.
        avoid_ball: bool,
        fallback: PlanFallback,
    },
    Kick {
        chip: bool,
        /// 0 to 1
        strength: f64,
    },
    Hold {
        dribble: bool,
    },
}

impl Action {
    pub fn move_to(target: Pose) -> Self {
        Action::MoveTo {
            target,
            dribble: false,
            avoid_ball: true,
            fallback: PlanFallback::default(),
        }
    }
}

/// Final output per robot.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotCommand {
    FollowPath { path: Path, dribble: bool },
    Kick { chip: bool, strength: f64 },
    Hold { pose: Pose, dribble: bool },
}
