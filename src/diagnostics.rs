use std::fmt::{self, Display, Formatter};

use crate::{
    command::PlanFallback,
    error::{InfeasibleAssignment, MalformedState, PlanningFailure},
    role_assignment::RoleId,
    world::RobotId,
    NodeKind, Status,
};

/// Something worth knowing about a tick. Returned with every [`TickOutput`](crate::TickOutput)
/// and mirrored to the `log` facade as it is raised.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    PlaySelected {
        play: String,
        previous: Option<String>,
    },
    /// A node changed its FSM state or its status.
    NodeState {
        node: String,
        kind: NodeKind,
        state: &'static str,
        status: Status,
    },
    RoleAssigned {
        role: RoleId,
        robot: RobotId,
    },
    InfeasibleAssignment(InfeasibleAssignment),
    /// A second node requested an already requested role; the first request wins.
    DuplicateRole {
        role: RoleId,
        node: String,
    },
    PlanningSucceeded {
        robot: RobotId,
        waypoints: usize,
    },
    PlanningFailed {
        robot: RobotId,
        reason: PlanningFailure,
        fallback: PlanFallback,
    },
    PathReused {
        robot: RobotId,
    },
    MalformedState(MalformedState),
    DeadlineExceeded {
        stage: &'static str,
    },
    /// Two bound skills tried to command the same robot.
    ActionConflict {
        robot: RobotId,
    },
}

impl DiagnosticEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::InfeasibleAssignment(_)
                | Self::DuplicateRole { .. }
                | Self::PlanningFailed { .. }
                | Self::MalformedState(_)
                | Self::DeadlineExceeded { .. }
                | Self::ActionConflict { .. }
        )
    }

    pub(crate) fn log(&self) {
        if self.is_warning() {
            log::warn!("{}", self);
        } else {
            log::debug!("{}", self);
        }
    }
}

impl Display for DiagnosticEvent {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::PlaySelected { play, previous } => match previous {
                Some(previous) => write!(fmt, "Play switched from {} to {}", previous, play),
                None => write!(fmt, "Play {} selected", play),
            },
            Self::NodeState {
                node,
                kind,
                state,
                status,
            } => write!(fmt, "{:?} node {} is {:?} in {:?}", kind, node, status, state),
            Self::RoleAssigned { role, robot } => {
                write!(fmt, "Role {} assigned to robot {}", role, robot)
            }
            Self::InfeasibleAssignment(e) => write!(fmt, "{}", e),
            Self::DuplicateRole { role, node } => {
                write!(fmt, "Role {} requested again by {}; ignored", role, node)
            }
            Self::PlanningSucceeded { robot, waypoints } => {
                write!(fmt, "Planned {} waypoints for robot {}", waypoints, robot)
            }
            Self::PlanningFailed {
                robot,
                reason,
                fallback,
            } => write!(
                fmt,
                "Planning failed for robot {}: {}; falling back to {:?}",
                robot, reason, fallback
            ),
            Self::PathReused { robot } => write!(fmt, "Reusing the path of robot {}", robot),
            Self::MalformedState(e) => write!(fmt, "Malformed world state: {}", e),
            Self::DeadlineExceeded { stage } => {
                write!(fmt, "Tick deadline exceeded before {}", stage)
            }
            Self::ActionConflict { robot } => {
                write!(fmt, "Robot {} was given more than one action", robot)
            }
        }
    }
}
