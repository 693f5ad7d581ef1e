use std::fmt::{self, Display, Formatter};

use crate::{role_assignment::RoleId, RobotId};

#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    Yaml(serde_yaml::Error),
    /// A motion limit that is not strictly positive and finite.
    InvalidConstraint {
        robot: Option<RobotId>,
        field: &'static str,
        value: f64,
    },
    InvalidPlanner {
        field: &'static str,
        value: f64,
    },
    InvalidField {
        field: &'static str,
        value: f64,
    },
    InvalidAssignment {
        field: &'static str,
        value: f64,
    },
    InvalidObstacle(usize),
    DuplicateRobot(RobotId),
    ZeroDeadline,
}

impl Display for ConfigError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Yaml(e) => e.fmt(fmt),
            Self::InvalidConstraint {
                robot: Some(robot),
                field,
                value,
            } => write!(fmt, "Robot {}: {} must be positive, got {}", robot, field, value),
            Self::InvalidConstraint {
                robot: None,
                field,
                value,
            } => write!(fmt, "{} must be positive, got {}", field, value),
            Self::InvalidPlanner { field, value } => {
                write!(fmt, "Planner setting {} is out of range: {}", field, value)
            }
            Self::InvalidField { field, value } => {
                write!(fmt, "Field dimension {} must be positive, got {}", field, value)
            }
            Self::InvalidAssignment { field, value } => {
                write!(fmt, "Assignment setting {} is out of range: {}", field, value)
            }
            Self::InvalidObstacle(idx) => write!(fmt, "Static obstacle #{} is degenerate", idx),
            Self::DuplicateRobot(id) => write!(fmt, "Robot {} is configured twice", id),
            Self::ZeroDeadline => write!(fmt, "Tick deadline must be at least 1 ms"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum AddChildError {
    TooManyNodes,
}

impl Display for AddChildError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::TooManyNodes => write!(fmt, "Attempted to add too many nodes"),
        }
    }
}

pub type AddChildResult = Result<(), AddChildError>;

impl std::error::Error for AddChildError {}

#[derive(Debug, PartialEq)]
#[non_exhaustive]
pub enum ParamError {
    Missing(&'static str),
    Invalid {
        key: String,
        expected: &'static str,
    },
    Unknown(String),
}

impl Display for ParamError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(fmt, "missing parameter {:?}", key),
            Self::Invalid { key, expected } => {
                write!(fmt, "parameter {:?} should be {}", key, expected)
            }
            Self::Unknown(key) => write!(fmt, "unknown parameter {:?}", key),
        }
    }
}

impl std::error::Error for ParamError {}

#[derive(Debug)]
#[non_exhaustive]
pub enum LoadError {
    Parse { line: usize, near: String },
    MissingNode(String),
    DuplicatePlay(String),
    DuplicateTactic(String),
    InfiniteRecursion { node: String },
    AddChildError(AddChildError, String),
    Param { node: String, error: ParamError },
    InvalidGuard { key: String, value: String },
}

impl Display for LoadError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Parse { line, near } => {
                write!(fmt, "Syntax error on line {} near {:?}", line, near)
            }
            Self::MissingNode(node) => {
                write!(fmt, "Node type or tactic name not found {:?}", node)
            }
            Self::DuplicatePlay(name) => write!(fmt, "Play {:?} is defined twice", name),
            Self::DuplicateTactic(name) => write!(fmt, "Tactic {:?} is defined twice", name),
            Self::InfiniteRecursion { node } => write!(fmt, "Infinite recursion in {:?}", node),
            Self::AddChildError(e, node) => {
                e.fmt(fmt)?;
                write!(fmt, " to {}", node)
            }
            Self::Param { node, error } => write!(fmt, "{}: {}", node, error),
            Self::InvalidGuard { key, value } => {
                write!(fmt, "Invalid play condition {} = {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Why a mandatory role did not get a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibleReason {
    /// No robot is available at all.
    NoRobots,
    /// No available robot has the required capabilities (or is the required robot).
    NoCapableRobot,
    /// Capable robots exist but they went to higher priority roles.
    Outranked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfeasibleAssignment {
    pub role: RoleId,
    pub reason: InfeasibleReason,
}

impl Display for InfeasibleAssignment {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        let reason = match self.reason {
            InfeasibleReason::NoRobots => "no robots available",
            InfeasibleReason::NoCapableRobot => "no capable robot",
            InfeasibleReason::Outranked => "all capable robots went to higher priority roles",
        };
        write!(fmt, "Cannot assign role {}: {}", self.role, reason)
    }
}

impl std::error::Error for InfeasibleAssignment {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlanningFailure {
    /// Start or goal is not a finite point, or the goal lies outside the field bounds.
    InvalidRequest,
    GoalObstructed,
    BudgetExhausted { iterations: usize },
    DeadlineExceeded,
    Cancelled,
}

impl Display for PlanningFailure {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidRequest => {
                write!(fmt, "Start or goal is not finite, or the goal is off the field")
            }
            Self::GoalObstructed => write!(fmt, "Goal lies inside an obstacle"),
            Self::BudgetExhausted { iterations } => {
                write!(fmt, "No path found within {} iterations", iterations)
            }
            Self::DeadlineExceeded => write!(fmt, "Planning deadline exceeded"),
            Self::Cancelled => write!(fmt, "Planning cancelled by a newer world state"),
        }
    }
}

impl std::error::Error for PlanningFailure {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MalformedState {
    NonFiniteTimestamp,
    NonFiniteRobot(RobotId),
    DuplicateRobot(RobotId),
    NonFiniteBall,
}

impl Display for MalformedState {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::NonFiniteTimestamp => write!(fmt, "World timestamp is not finite"),
            Self::NonFiniteRobot(id) => write!(fmt, "Robot {} has a non-finite pose", id),
            Self::DuplicateRobot(id) => write!(fmt, "Robot {} is reported twice", id),
            Self::NonFiniteBall => write!(fmt, "Ball observation is not finite"),
        }
    }
}

impl std::error::Error for MalformedState {}
