use std::collections::BTreeMap;

use super::Path;
use crate::{
    config::PlannerConfig,
    error::PlanningFailure,
    geometry::{normalize_angle, Point, Pose, ShapeSet},
    world::RobotId,
};

#[derive(Debug, Clone)]
struct CachedPath {
    goal: Pose,
    obstacles: ShapeSet,
    path: Path,
}

/// Last planned path per robot.
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    paths: BTreeMap<RobotId, CachedPath>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached path of `robot`, if it still leads to `goal` (position and heading)
    /// through the same obstacles and the robot has not strayed from it. The part already
    /// driven is cut off.
    pub fn lookup(
        &self,
        robot: RobotId,
        position: &Point,
        goal: &Pose,
        obstacles: &ShapeSet,
        config: &PlannerConfig,
    ) -> Option<Path> {
        let cached = self.paths.get(&robot)?;
        if (cached.goal.position - goal.position).norm() > config.replan_goal_tolerance {
            return None;
        }
        if normalize_angle(cached.goal.heading - goal.heading).abs()
            > config.replan_heading_tolerance
        {
            return None;
        }
        if !cached.obstacles.approx_eq(obstacles, config.replan_obstacle_tolerance) {
            return None;
        }
        cached.path.remaining_from(position, config.step_size)
    }

    /// The cached path regardless of how the world changed. Used when there is no time
    /// left to plan.
    pub fn stale(&self, robot: RobotId, position: &Point, max_offset: f64) -> Option<Path> {
        self.paths.get(&robot)?.path.remaining_from(position, max_offset)
    }

    pub fn store(&mut self, robot: RobotId, goal: Pose, obstacles: ShapeSet, path: Path) {
        self.paths.insert(
            robot,
            CachedPath {
                goal,
                obstacles,
                path,
            },
        );
    }

    pub fn remove(&mut self, robot: RobotId) {
        self.paths.remove(&robot);
    }

    pub fn contains(&self, robot: RobotId) -> bool {
        self.paths.contains_key(&robot)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// How planning went for each robot, handed to the behaviors in the next tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanFeedback {
    failures: BTreeMap<RobotId, (u32, PlanningFailure)>,
}

impl PlanFeedback {
    pub fn record_success(&mut self, robot: RobotId) {
        self.failures.remove(&robot);
    }

    pub fn record_failure(&mut self, robot: RobotId, failure: PlanningFailure) {
        let entry = self.failures.entry(robot).or_insert((0, failure));
        entry.0 += 1;
        entry.1 = failure;
    }

    /// Number of planning failures in a row for `robot`.
    pub fn consecutive_failures(&self, robot: RobotId) -> u32 {
        self.failures.get(&robot).map_or(0, |(n, _)| *n)
    }

    pub fn last_failure(&self, robot: RobotId) -> Option<PlanningFailure> {
        self.failures.get(&robot).map(|(_, f)| *f)
    }
}
