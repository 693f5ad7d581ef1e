//! # robo-gameplay (Rust crate)
//!
//! Per-tick decision pipeline for small-size robot soccer.
//!
//!
//! ## Overview
//!
//! Every control cycle the caller hands a [`WorldState`] snapshot to a [`GameplayModule`].
//! The module picks a play from the game state, ticks the play's behavior tree once,
//! assigns robots to the roles the tree asked for, plans a collision-free path for every
//! robot that has to move and returns one [`RobotCommand`] per robot.
//!
//! A behavior tree is an extension to finite state machines that makes describing
//! transitional behavior easier. Leaves of the tree are *skills* (capture the ball,
//! kick, guard the goal), each with its own small state machine. Inner nodes compose
//! them in sequence, as alternatives or in parallel.
//!
//!
//! ## Play scripts
//!
//! Plays are written in a small text format and loaded into a [`Playbook`].
//!
//! ```text
//! # Attack with whoever is closest to the ball
//! tactic Strike = Sequence {
//!     Capture(role = striker, mandatory = true, priority = 5)
//!     PivotKick(role = striker, target = their_goal)
//! }
//!
//! play Offense(priority = 10) when stage == playing = Parallel {
//!     Goalie(role = goalie, priority = 9)
//!     Strike
//!     HoldPosition(role = support, at = "1.0, -1.0", required = false)
//! }
//! ```
//!
//! A node is written as `Type(param = value, ...)` with an optional block of children.
//! `tactic` declares a reusable subtree, `play` declares a root with an optional
//! `when` guard over `stage`, `restart` and `possession`.
//!
//! Skills that drive a robot take a `role` parameter. Roles with the same name share a
//! robot, which is how consecutive skills in a sequence keep working with the same robot.
//!
//!
//! ## Ticking
//!
//! ```rust
//! use robo_gameplay::{GameplayConfig, GameplayModule, Playbook, Registry, WorldState, Team};
//!
//! let registry = Registry::default();
//! let playbook = Playbook::from_source("play Rest = Idle", &registry).unwrap();
//! let mut gameplay = GameplayModule::new(GameplayConfig::default(), playbook).unwrap();
//! let output = gameplay.tick(&WorldState::new(0.0, Team::Blue));
//! assert_eq!(output.play.as_deref(), Some("Rest"));
//! ```
//!
//! Role assignment and path planning are pure functions of their inputs and can be used
//! on their own, see [`role_assignment::assign`] and [`planning::RrtPlanner`].

mod command;
pub mod config;
mod container;
mod context;
mod diagnostics;
pub mod error;
pub mod fsm;
mod gameplay;
pub mod geometry;
mod nodes;
pub mod parser;
pub mod planning;
mod playbook;
mod registry;
pub mod role_assignment;
pub mod skills;
pub mod world;

pub use crate::command::{Action, PlanFallback, RobotCommand};
pub use crate::config::{GameplayConfig, MotionConstraints};
pub use crate::container::BehaviorNodeContainer;
pub use crate::context::{Context, RoleBinding};
pub use crate::diagnostics::DiagnosticEvent;
pub use crate::gameplay::{GameplayModule, TickOutput};
pub use crate::nodes::{ParallelNode, RepeatNode, SelectorNode, SequenceNode, TimedNode};
pub use crate::playbook::{Play, PlayGuard, Playbook};
pub use crate::registry::{boxify, Constructor, NodeParams, ParamValue, Registry};
pub use crate::world::{RobotId, Team, WorldState};

use crate::role_assignment::RoleRequest;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Status {
    Success,
    Failed,
    /// The node should keep running in the next tick
    Running,
}

impl Status {
    /// Success and Failed are terminal until the node is reset.
    pub fn is_done(self) -> bool {
        !matches!(self, Status::Running)
    }
}

/// What a node is, as far as diagnostics and tree surgery are concerned.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NodeKind {
    Leaf,
    Composite,
    Timed,
    Play,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NumChildren {
    Finite(usize),
    Infinite,
}

impl PartialOrd for NumChildren {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(match (self, other) {
            (NumChildren::Finite(_), NumChildren::Infinite) => std::cmp::Ordering::Less,
            (NumChildren::Infinite, NumChildren::Finite(_)) => std::cmp::Ordering::Greater,
            (NumChildren::Finite(lhs), NumChildren::Finite(rhs)) => lhs.cmp(rhs),
            (NumChildren::Infinite, NumChildren::Infinite) => return None,
        })
    }
}

pub trait BehaviorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn max_children(&self) -> NumChildren {
        NumChildren::Finite(0)
    }

    /// Advance the node by one tick. Composite nodes drive `children` themselves,
    /// leaves get an empty slice.
    fn tick(&mut self, children: &mut [BehaviorNodeContainer], ctx: &mut Context) -> Status;

    /// The robot this node needs for the current tick, if any.
    fn role_request(&self, _world: &WorldState, _config: &GameplayConfig) -> Option<RoleRequest> {
        None
    }

    /// Indices of the children that will be ticked this tick and therefore get to
    /// request robots.
    fn active_children(&self, children: &[BehaviorNodeContainer]) -> Vec<usize> {
        (0..children.len()).collect()
    }

    /// Return to the initial state so the node can be reused.
    fn reset(&mut self) {}

    /// Name of the current FSM state, reported in diagnostics.
    fn state_name(&self) -> &'static str {
        ""
    }
}
