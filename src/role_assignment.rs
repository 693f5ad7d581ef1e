//! Binding role requirements to robots.
//!
//! Every tick the behavior tree produces a set of [`RoleRequest`]s. [`assign`] turns
//! them into an [`Assignment`] by solving a minimum-cost bipartite matching between
//! requests and the robots available this tick.
//!
//! The cost of a pairing is the distance from the robot to the preferred position,
//! minus a bonus when the robot held the same sticky role in the previous tick.
//! A missing hard capability makes a pairing impossible. Leaving a request unfilled
//! costs far more than any travel distance and grows with the request's priority,
//! so when robots are scarce the lower priority requests go without.
//!
//! Ties are broken by priority first, then by robot id: requests are ordered by
//! descending priority and role name, robots by id, and a small penalty proportional
//! to both ranks is added so the lowest id robot goes to the highest priority request.

use std::{collections::BTreeMap, fmt};

use pathfinding::{kuhn_munkres::kuhn_munkres_min, matrix::Matrix};

use crate::{
    config::AssignmentConfig,
    error::{InfeasibleAssignment, InfeasibleReason},
    geometry::Point,
    world::RobotId,
};

/// Name of a role, unique within the active play.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Hardware a role cannot do without.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub dribbler: bool,
    pub kicker: bool,
    pub chipper: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            dribbler: true,
            kicker: true,
            chipper: true,
        }
    }

    /// Whether a robot with `have` provides everything in `self`.
    pub fn satisfied_by(&self, have: &Capabilities) -> bool {
        (!self.dribbler || have.dribbler)
            && (!self.kicker || have.kicker)
            && (!self.chipper || have.chipper)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleRequirements {
    pub capabilities: Capabilities,
    pub preferred_position: Option<Point>,
    pub priority: u8,
    /// An unfilled mandatory role fails its behavior.
    pub mandatory: bool,
    /// Keep the previous robot unless a clearly better one shows up.
    pub sticky: bool,
    /// Only this robot may take the role, e.g. the designated goalie.
    pub required_robot: Option<RobotId>,
}

impl Default for RoleRequirements {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            preferred_position: None,
            priority: 0,
            mandatory: false,
            sticky: true,
            required_robot: None,
        }
    }
}

impl RoleRequirements {
    pub fn near(position: Point) -> Self {
        Self {
            preferred_position: Some(position),
            ..Self::default()
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn not_sticky(mut self) -> Self {
        self.sticky = false;
        self
    }

    pub fn requiring(mut self, robot: RobotId) -> Self {
        self.required_robot = Some(robot);
        self
    }

    fn accepts(&self, robot: &Candidate) -> bool {
        self.capabilities.satisfied_by(&robot.capabilities)
            && self.required_robot.map_or(true, |id| id == robot.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleRequest {
    pub role: RoleId,
    pub requirements: RoleRequirements,
}

impl RoleRequest {
    pub fn new(role: impl Into<RoleId>, requirements: RoleRequirements) -> Self {
        Self {
            role: role.into(),
            requirements,
        }
    }
}

impl From<String> for RoleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A robot that may take a role this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: RobotId,
    pub position: Point,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleOutcome {
    Assigned(RobotId),
    /// Optional role without a robot this tick.
    Unfilled,
    Infeasible(InfeasibleAssignment),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    outcomes: BTreeMap<RoleId, RoleOutcome>,
}

impl Assignment {
    pub fn outcome(&self, role: &RoleId) -> Option<&RoleOutcome> {
        self.outcomes.get(role)
    }

    pub fn robot(&self, role: &RoleId) -> Option<RobotId> {
        match self.outcomes.get(role) {
            Some(RoleOutcome::Assigned(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn role_of(&self, robot: RobotId) -> Option<&RoleId> {
        self.bindings().find(|(_, id)| *id == robot).map(|(role, _)| role)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&RoleId, RobotId)> {
        self.outcomes.iter().filter_map(|(role, outcome)| match outcome {
            RoleOutcome::Assigned(id) => Some((role, *id)),
            _ => None,
        })
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&RoleId, &RoleOutcome)> {
        self.outcomes.iter()
    }

    pub fn infeasible(&self) -> impl Iterator<Item = &InfeasibleAssignment> {
        self.outcomes.values().filter_map(|outcome| match outcome {
            RoleOutcome::Infeasible(e) => Some(e),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// The previous assignment restricted to what is still requested and still
    /// available. Used when there is no time left to solve a fresh one.
    pub fn carried_over(&self, requests: &[RoleRequest], robots: &[Candidate]) -> Assignment {
        let outcomes = requests
            .iter()
            .map(|req| {
                let outcome = match self.robot(&req.role) {
                    Some(id) if robots.iter().any(|c| c.id == id) => RoleOutcome::Assigned(id),
                    _ if req.requirements.mandatory => {
                        RoleOutcome::Infeasible(InfeasibleAssignment {
                            role: req.role.clone(),
                            reason: InfeasibleReason::Outranked,
                        })
                    }
                    _ => RoleOutcome::Unfilled,
                };
                (req.role.clone(), outcome)
            })
            .collect();
        Assignment { outcomes }
    }
}

/// Robots that held sticky roles in the previous tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickyBindings(BTreeMap<RoleId, RobotId>);

impl StickyBindings {
    pub fn from_assignment(assignment: &Assignment, requests: &[RoleRequest]) -> Self {
        Self(
            requests
                .iter()
                .filter(|req| req.requirements.sticky)
                .filter_map(|req| Some((req.role.clone(), assignment.robot(&req.role)?)))
                .collect(),
        )
    }

    pub fn get(&self, role: &RoleId) -> Option<RobotId> {
        self.0.get(role).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cost units are millimeters times `TIE_SCALE`.
const TIE_SCALE: i64 = 1_000;
const UNFILLED: i64 = 100_000_000_000;
const UNFILLED_MANDATORY: i64 = 100_000_000_000_000;
const INFEASIBLE: i64 = 10_000_000_000_000_000;

fn unfilled_cost(req: &RoleRequirements) -> i64 {
    let base = UNFILLED * (req.priority as i64 + 1);
    if req.mandatory {
        base + UNFILLED_MANDATORY
    } else {
        base
    }
}

/// Distances beyond this cost the same. Keeps every travel cost below `UNFILLED`.
const MAX_TRAVEL: f64 = 10_000.;

fn meters_to_cost(meters: f64) -> i64 {
    (meters.clamp(0., MAX_TRAVEL) * 1000.).round() as i64 * TIE_SCALE
}

pub fn assign(
    requests: &[RoleRequest],
    robots: &[Candidate],
    sticky: &StickyBindings,
    config: &AssignmentConfig,
) -> Assignment {
    if requests.is_empty() {
        return Assignment::default();
    }

    let mut order: Vec<&RoleRequest> = requests.iter().collect();
    order.sort_by(|a, b| {
        b.requirements
            .priority
            .cmp(&a.requirements.priority)
            .then_with(|| a.role.cmp(&b.role))
    });
    order.dedup_by(|a, b| a.role == b.role);

    let mut robots: Vec<&Candidate> = robots.iter().collect();
    robots.sort_by_key(|c| c.id);
    robots.dedup_by_key(|c| c.id);

    let rows = order.len();
    let columns = robots.len();
    let bonus = meters_to_cost(config.sticky_bonus);

    // One dummy column per request stands for "no robot", so the matrix is never
    // taller than it is wide.
    let costs = Matrix::from_fn(rows, columns + rows, |(row, col)| {
        let req = &order[row].requirements;
        if col >= columns {
            return unfilled_cost(req);
        }
        let robot = robots[col];
        if !req.accepts(robot) {
            return INFEASIBLE;
        }
        let mut cost = req
            .preferred_position
            .map_or(0, |p| meters_to_cost((robot.position - p).norm()));
        if req.sticky && sticky.get(&order[row].role) == Some(robot.id) {
            cost = cost.saturating_sub(bonus);
        }
        cost.saturating_add((col as i64) * ((rows - row) as i64))
    });

    let (_, matching) = kuhn_munkres_min(&costs);

    let mut outcomes = BTreeMap::new();
    for (row, &col) in matching.iter().enumerate() {
        let req = order[row];
        let outcome = if col < columns && req.requirements.accepts(robots[col]) {
            log::debug!("role {} -> robot {}", req.role, robots[col].id);
            RoleOutcome::Assigned(robots[col].id)
        } else if req.requirements.mandatory {
            let reason = if columns == 0 {
                InfeasibleReason::NoRobots
            } else if robots.iter().any(|r| req.requirements.accepts(r)) {
                InfeasibleReason::Outranked
            } else {
                InfeasibleReason::NoCapableRobot
            };
            let error = InfeasibleAssignment {
                role: req.role.clone(),
                reason,
            };
            log::warn!("{}", error);
            RoleOutcome::Infeasible(error)
        } else {
            RoleOutcome::Unfilled
        };
        outcomes.insert(req.role.clone(), outcome);
    }

    Assignment { outcomes }
}

#[cfg(test)]
mod test;
