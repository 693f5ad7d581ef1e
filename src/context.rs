use std::collections::BTreeMap;

use crate::{
    command::Action,
    config::GameplayConfig,
    diagnostics::DiagnosticEvent,
    error::InfeasibleAssignment,
    planning::PlanFeedback,
    role_assignment::{Assignment, RoleId, RoleOutcome},
    world::{RobotId, RobotObservation, WorldState},
};

/// What a role resolved to in the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoleBinding<'a> {
    Assigned(&'a RobotObservation),
    /// Optional role that did not get a robot.
    Unfilled,
    Infeasible(&'a InfeasibleAssignment),
    /// The role was not requested this tick, e.g. the node just became active.
    Pending,
}

/// Everything a node may look at or produce while it is ticked.
///
/// The world, the configuration and the assignment are shared read-only. Actions and
/// diagnostic events are collected and handed to the caller after the tree was ticked.
pub struct Context<'a> {
    world: &'a WorldState,
    config: &'a GameplayConfig,
    assignment: &'a Assignment,
    feedback: &'a PlanFeedback,
    actions: BTreeMap<RobotId, Action>,
    events: Vec<DiagnosticEvent>,
}

impl<'a> Context<'a> {
    pub fn new(
        world: &'a WorldState,
        config: &'a GameplayConfig,
        assignment: &'a Assignment,
        feedback: &'a PlanFeedback,
    ) -> Self {
        Self {
            world,
            config,
            assignment,
            feedback,
            actions: BTreeMap::new(),
            events: vec![],
        }
    }

    pub fn world(&self) -> &'a WorldState {
        self.world
    }

    pub fn config(&self) -> &'a GameplayConfig {
        self.config
    }

    pub fn assignment(&self) -> &'a Assignment {
        self.assignment
    }

    pub fn binding(&self, role: &RoleId) -> RoleBinding<'a> {
        let world = self.world;
        match self.assignment.outcome(role) {
            Some(RoleOutcome::Assigned(id)) => world
                .robot(*id)
                .map_or(RoleBinding::Unfilled, RoleBinding::Assigned),
            Some(RoleOutcome::Unfilled) => RoleBinding::Unfilled,
            Some(RoleOutcome::Infeasible(e)) => RoleBinding::Infeasible(e),
            None => RoleBinding::Pending,
        }
    }

    /// Consecutive planning failures of `robot` up to the previous tick.
    pub fn plan_failures(&self, robot: RobotId) -> u32 {
        self.feedback.consecutive_failures(robot)
    }

    /// Command `robot` for this tick. The first action wins; later ones are reported
    /// as conflicts.
    pub fn act(&mut self, robot: RobotId, action: Action) {
        if self.actions.contains_key(&robot) {
            self.emit(DiagnosticEvent::ActionConflict { robot });
        } else {
            self.actions.insert(robot, action);
        }
    }

    pub fn action(&self, robot: RobotId) -> Option<&Action> {
        self.actions.get(&robot)
    }

    pub fn emit(&mut self, event: DiagnosticEvent) {
        event.log();
        self.events.push(event);
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn into_parts(self) -> (BTreeMap<RobotId, Action>, Vec<DiagnosticEvent>) {
        (self.actions, self.events)
    }
}
