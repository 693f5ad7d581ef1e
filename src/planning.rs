//! Sampling-based motion planning.
//!
//! [`RrtPlanner`] grows a rapidly-exploring random tree from the robot towards the goal,
//! shortcuts the resulting polyline and turns it into a timed [`Path`] that respects
//! the robot's [`MotionConstraints`](crate::MotionConstraints).
//! [`PathCache`] decides whether last tick's path is still good enough to keep.

mod cache;
mod path;
mod rrt;
mod tree;

pub use self::{
    cache::{PathCache, PlanFeedback},
    path::{Path, Waypoint, MAX_WAYPOINTS},
    rrt::{Budget, PlanRequest, RrtPlanner},
    tree::{PlannerTree, TreeNode},
};
