//! Startup configuration, normally read from a YAML file.
//!
//! ```yaml
//! team: yellow
//! tick_deadline_ms: 16
//! seed: 7
//! constraints: { max_speed: 2.5, max_acceleration: 2.0, max_angular_speed: 8.0 }
//! robots:
//!   - { id: 0, chipper: true }
//!   - { id: 3, kicker: false }
//! static_obstacles:
//!   - { shape: circle, center: [0.0, 0.0], radius: 0.5 }
//! ```
//!
//! Every field has a default, so an empty document is a valid configuration.

use std::{collections::BTreeSet, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    geometry::{point, Point, Shape, ShapeSet},
    role_assignment::Capabilities,
    world::{RobotId, Team},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionConstraints {
    /// m/s
    pub max_speed: f64,
    /// m/s^2
    pub max_acceleration: f64,
    /// rad/s
    pub max_angular_speed: f64,
}

impl Default for MotionConstraints {
    fn default() -> Self {
        Self {
            max_speed: 2.0,
            max_acceleration: 1.5,
            max_angular_speed: 6.0,
        }
    }
}

impl MotionConstraints {
    fn validate(&self, robot: Option<RobotId>) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_speed", self.max_speed),
            ("max_acceleration", self.max_acceleration),
            ("max_angular_speed", self.max_angular_speed),
        ] {
            if !(value.is_finite() && value > 0.) {
                return Err(ConfigError::InvalidConstraint {
                    robot,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobotConfig {
    pub id: RobotId,
    /// Disabled robots are never assigned and always hold.
    pub enabled: bool,
    pub dribbler: bool,
    pub kicker: bool,
    pub chipper: bool,
    /// Overrides the team-wide constraints.
    pub constraints: Option<MotionConstraints>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            id: RobotId(0),
            enabled: true,
            dribbler: true,
            kicker: true,
            chipper: false,
            constraints: None,
        }
    }
}

impl RobotConfig {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            dribbler: self.dribbler,
            kicker: self.kicker,
            chipper: self.chipper,
        }
    }
}

/// Field dimensions in meters. Our goal is at -x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Field {
    pub length: f64,
    pub width: f64,
    pub goal_width: f64,
    /// Extra room outside the lines the planner may still use.
    pub boundary: f64,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            length: 9.,
            width: 6.,
            goal_width: 1.,
            boundary: 0.3,
        }
    }
}

impl Field {
    pub fn their_goal(&self) -> Point {
        point(self.length / 2., 0.)
    }

    pub fn our_goal(&self) -> Point {
        point(-self.length / 2., 0.)
    }

    /// Lower-left and upper-right corner of the drivable area.
    pub fn bounds(&self) -> (Point, Point) {
        let hx = self.length / 2. + self.boundary;
        let hy = self.width / 2. + self.boundary;
        (point(-hx, -hy), point(hx, hy))
    }

    pub fn contains(&self, p: &Point) -> bool {
        let (min, max) = self.bounds();
        (min.x..=max.x).contains(&p.x) && (min.y..=max.y).contains(&p.y)
    }

    /// The closest point of the drivable area.
    pub fn clamp(&self, p: &Point) -> Point {
        let (min, max) = self.bounds();
        point(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("length", self.length),
            ("width", self.width),
            ("goal_width", self.goal_width),
        ] {
            if !(value.is_finite() && value > 0.) {
                return Err(ConfigError::InvalidField { field, value });
            }
        }
        if !(self.boundary.is_finite() && self.boundary >= 0.) {
            return Err(ConfigError::InvalidField {
                field: "boundary",
                value: self.boundary,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Length of one tree extension in meters.
    pub step_size: f64,
    /// Probability of sampling the goal instead of a random point.
    pub goal_bias: f64,
    pub max_iterations: usize,
    /// Spacing of the interpolated waypoints.
    pub waypoint_spacing: f64,
    /// Margin kept between the robot and obstacles, on top of the radii.
    pub clearance: f64,
    /// A cached path is reused while its goal moved less than this.
    pub replan_goal_tolerance: f64,
    /// ... and no obstacle moved more than this.
    pub replan_obstacle_tolerance: f64,
    /// ... and the heading wanted at the goal turned less than this, in radians.
    pub replan_heading_tolerance: f64,
    /// Deadline and cancel flag are polled every this many iterations.
    pub check_interval: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            step_size: 0.15,
            goal_bias: 0.2,
            max_iterations: 500,
            waypoint_spacing: 0.1,
            clearance: 0.02,
            replan_goal_tolerance: 0.03,
            replan_obstacle_tolerance: 0.05,
            replan_heading_tolerance: 0.1,
            check_interval: 16,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("step_size", self.step_size),
            ("waypoint_spacing", self.waypoint_spacing),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.) {
                return Err(ConfigError::InvalidPlanner { field, value });
            }
        }
        let non_negative = [
            ("clearance", self.clearance),
            ("replan_goal_tolerance", self.replan_goal_tolerance),
            ("replan_obstacle_tolerance", self.replan_obstacle_tolerance),
            ("replan_heading_tolerance", self.replan_heading_tolerance),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.) {
                return Err(ConfigError::InvalidPlanner { field, value });
            }
        }
        if !(0. ..=1.).contains(&self.goal_bias) {
            return Err(ConfigError::InvalidPlanner {
                field: "goal_bias",
                value: self.goal_bias,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidPlanner {
                field: "max_iterations",
                value: 0.,
            });
        }
        if self.check_interval == 0 {
            return Err(ConfigError::InvalidPlanner {
                field: "check_interval",
                value: 0.,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssignmentConfig {
    /// Meters of travel a robot may be "worse" than a newcomer before a sticky role
    /// changes hands.
    pub sticky_bonus: f64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self { sticky_bonus: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ObstacleConfig {
    Circle { center: [f64; 2], radius: f64 },
    Rect { min: [f64; 2], max: [f64; 2] },
}

impl ObstacleConfig {
    pub fn to_shape(&self) -> Shape {
        match *self {
            ObstacleConfig::Circle { center, radius } => {
                Shape::circle(point(center[0], center[1]), radius)
            }
            ObstacleConfig::Rect { min, max } => {
                Shape::rect(point(min[0], min[1]), point(max[0], max[1]))
            }
        }
    }

    fn is_valid(&self) -> bool {
        match *self {
            ObstacleConfig::Circle { center, radius } => {
                center.iter().all(|v| v.is_finite()) && radius.is_finite() && radius > 0.
            }
            ObstacleConfig::Rect { min, max } => {
                min.iter().chain(&max).all(|v| v.is_finite()) && min[0] < max[0] && min[1] < max[1]
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameplayConfig {
    pub team: Team,
    pub tick_deadline_ms: u64,
    /// Fixed seed for the planner's random source. A fresh entropy seed is used when absent.
    pub seed: Option<u64>,
    pub field: Field,
    pub robot_radius: f64,
    pub ball_radius: f64,
    pub constraints: MotionConstraints,
    pub robots: Vec<RobotConfig>,
    pub planner: PlannerConfig,
    pub assignment: AssignmentConfig,
    pub static_obstacles: Vec<ObstacleConfig>,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            team: Team::Blue,
            tick_deadline_ms: 16,
            seed: None,
            field: Field::default(),
            robot_radius: 0.09,
            ball_radius: 0.0215,
            constraints: MotionConstraints::default(),
            robots: vec![],
            planner: PlannerConfig::default(),
            assignment: AssignmentConfig::default(),
            static_obstacles: vec![],
        }
    }
}

impl GameplayConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: GameplayConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_deadline_ms == 0 {
            return Err(ConfigError::ZeroDeadline);
        }
        self.field.validate()?;
        for (field, value) in [
            ("robot_radius", self.robot_radius),
            ("ball_radius", self.ball_radius),
        ] {
            if !(value.is_finite() && value > 0.) {
                return Err(ConfigError::InvalidField { field, value });
            }
        }
        self.constraints.validate(None)?;
        self.planner.validate()?;
        if !(self.assignment.sticky_bonus.is_finite() && self.assignment.sticky_bonus >= 0.) {
            return Err(ConfigError::InvalidAssignment {
                field: "sticky_bonus",
                value: self.assignment.sticky_bonus,
            });
        }

        let mut ids = BTreeSet::new();
        for robot in &self.robots {
            if !ids.insert(robot.id) {
                return Err(ConfigError::DuplicateRobot(robot.id));
            }
            if let Some(constraints) = &robot.constraints {
                constraints.validate(Some(robot.id))?;
            }
        }
        for (idx, obstacle) in self.static_obstacles.iter().enumerate() {
            if !obstacle.is_valid() {
                return Err(ConfigError::InvalidObstacle(idx));
            }
        }
        Ok(())
    }

    pub fn tick_deadline(&self) -> Duration {
        Duration::from_millis(self.tick_deadline_ms)
    }

    /// Settings of a robot; robots missing from the list get the defaults.
    pub fn robot(&self, id: RobotId) -> RobotConfig {
        self.robots
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .unwrap_or(RobotConfig {
                id,
                ..RobotConfig::default()
            })
    }

    pub fn constraints_for(&self, id: RobotId) -> MotionConstraints {
        self.robots
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.constraints)
            .unwrap_or(self.constraints)
    }

    pub fn static_obstacles(&self) -> ShapeSet {
        self.static_obstacles.iter().map(|o| o.to_shape()).collect()
    }
}
