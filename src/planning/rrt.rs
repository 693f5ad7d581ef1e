use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use rand::Rng;

use super::{Path, PlannerTree};
use crate::{
    config::{Field, MotionConstraints, PlannerConfig},
    error::{ConfigError, PlanningFailure},
    geometry::{is_finite, point, Point, Pose, ShapeSet},
};

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub start: Point,
    /// Current speed of the robot, used as the initial speed of the profile.
    pub start_speed: f64,
    pub goal: Pose,
    /// Obstacles already grown by the robot's radius and clearance.
    pub obstacles: ShapeSet,
    pub constraints: MotionConstraints,
}

/// Limits on a single planning call.
#[derive(Debug, Clone, Copy)]
pub struct Budget<'a> {
    pub max_iterations: usize,
    pub deadline: Option<Instant>,
    /// Set from another thread when the world snapshot this plan is for became stale.
    pub cancel: Option<&'a AtomicBool>,
}

impl<'a> Budget<'a> {
    pub fn iterations(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            deadline: None,
            cancel: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn check(&self) -> Result<(), PlanningFailure> {
        if self.cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
            return Err(PlanningFailure::Cancelled);
        }
        if self.deadline.map_or(false, |d| Instant::now() >= d) {
            return Err(PlanningFailure::DeadlineExceeded);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RrtPlanner {
    config: PlannerConfig,
    bounds: (Point, Point),
}

impl RrtPlanner {
    pub fn new(config: PlannerConfig, field: &Field) -> Result<Self, ConfigError> {
        config.validate()?;
        field.validate()?;
        Ok(Self {
            config,
            bounds: field.bounds(),
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plan<R: Rng + ?Sized>(
        &self,
        request: &PlanRequest,
        rng: &mut R,
        budget: &Budget,
    ) -> Result<Path, PlanningFailure> {
        let start = request.start;
        let goal = request.goal.position;
        if !is_finite(&start) || !request.goal.is_finite() {
            return Err(PlanningFailure::InvalidRequest);
        }
        let (min, max) = self.bounds;
        if !(min.x..=max.x).contains(&goal.x) || !(min.y..=max.y).contains(&goal.y) {
            return Err(PlanningFailure::InvalidRequest);
        }

        // The robot may already be inside something; it has to be able to drive out.
        let obstacles = request.obstacles.without_containing(&start);
        if obstacles.hit_point(&goal) {
            return Err(PlanningFailure::GoalObstructed);
        }

        if !obstacles.hit_segment(&start, &goal) {
            return Ok(self.finish(&[start, goal], request));
        }

        let step = self.config.step_size;
        let mut tree = PlannerTree::new(start, step);
        for iteration in 0..budget.max_iterations {
            if iteration % self.config.check_interval == 0 {
                budget.check()?;
            }

            let sample = if rng.gen::<f64>() < self.config.goal_bias {
                goal
            } else {
                point(rng.gen_range(min.x..=max.x), rng.gen_range(min.y..=max.y))
            };

            let Some(idx) = tree.extend(&sample, &obstacles) else {
                continue;
            };
            let reached = tree.nodes()[idx].position;
            if (goal - reached).norm() <= step && !obstacles.hit_segment(&reached, &goal) {
                let end = if (goal - reached).norm() > 1e-9 {
                    tree.add(goal, idx)
                } else {
                    idx
                };
                let points = shortcut(&tree.path_to(end), &obstacles);
                log::debug!(
                    "rrt: {} nodes after {} iterations, {} corners",
                    tree.len(),
                    iteration + 1,
                    points.len()
                );
                return Ok(self.finish(&points, request));
            }
        }

        Err(PlanningFailure::BudgetExhausted {
            iterations: budget.max_iterations,
        })
    }

    fn finish(&self, points: &[Point], request: &PlanRequest) -> Path {
        Path::interpolate(
            points,
            request.start_speed,
            Some(request.goal.heading),
            &request.constraints,
            self.config.waypoint_spacing,
        )
    }
}

/// Greedily skip every corner the robot can drive past in a straight line.
fn shortcut(points: &[Point], obstacles: &ShapeSet) -> Vec<Point> {
    let Some(&first) = points.first() else {
        return vec![];
    };
    let mut out = vec![first];
    let mut i = 0;
    while i + 1 < points.len() {
        let mut j = points.len() - 1;
        while j > i + 1 && obstacles.hit_segment(&points[i], &points[j]) {
            j -= 1;
        }
        out.push(points[j]);
        i = j;
    }
    out
}
