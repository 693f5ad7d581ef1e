use crate::{
    config::MotionConstraints,
    geometry::{Point, ShapeSet},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: Point,
    /// Only set where the robot has to face a particular way, i.e. at the goal.
    pub heading: Option<f64>,
    /// Seconds since the start of the path.
    pub time: f64,
    /// Planned speed along the path in m/s.
    pub speed: f64,
}

/// Upper limit on the samples [`Path::interpolate`] produces; longer routes get coarser.
pub const MAX_WAYPOINTS: usize = 1000;

/// A timed route from a start to a goal. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Resample `points` every `spacing` meters and give every sample a speed and a
    /// time stamp. The spacing is widened as needed to stay within [`MAX_WAYPOINTS`].
    ///
    /// The speed profile is the classic trapezoid: accelerate from `start_speed`, cruise
    /// at `max_speed`, brake to a stop at the end. Between two samples the speed changes
    /// at most `max_acceleration` times the time between them.
    pub fn interpolate(
        points: &[Point],
        start_speed: f64,
        goal_heading: Option<f64>,
        constraints: &MotionConstraints,
        spacing: f64,
    ) -> Path {
        let total: f64 = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
        // Every segment rounds its step count up, so leave one sample of slack per corner
        let room = MAX_WAYPOINTS.saturating_sub(points.len()).max(1);
        let spacing = spacing.max(total / room as f64);
        let mut samples: Vec<Point> = vec![];
        for (i, p) in points.iter().enumerate() {
            let Some(prev) = i.checked_sub(1).map(|j| points[j]) else {
                samples.push(*p);
                continue;
            };
            let len = (p - prev).norm();
            if len < 1e-9 {
                continue;
            }
            let steps = (len / spacing).ceil().max(1.) as usize;
            for k in 1..=steps {
                samples.push(prev + (p - prev) * (k as f64 / steps as f64));
            }
        }

        let Some(&first) = samples.first() else {
            return Path { waypoints: vec![] };
        };
        if samples.len() == 1 {
            return Path {
                waypoints: vec![Waypoint {
                    position: first,
                    heading: goal_heading,
                    time: 0.,
                    speed: 0.,
                }],
            };
        }

        let accel = constraints.max_acceleration;
        let vmax2 = constraints.max_speed.powi(2);
        let ds: Vec<f64> = samples.windows(2).map(|w| (w[1] - w[0]).norm()).collect();

        // Squared speeds; both passes keep |v[k+1]^2 - v[k]^2| <= 2 a ds
        let mut v2 = vec![0.; samples.len()];
        v2[0] = start_speed.max(0.).powi(2).min(vmax2);
        for k in 1..samples.len() {
            v2[k] = (v2[k - 1] + 2. * accel * ds[k - 1]).min(vmax2);
        }
        let last = samples.len() - 1;
        v2[last] = 0.;
        for k in (0..last).rev() {
            v2[k] = v2[k].min(v2[k + 1] + 2. * accel * ds[k]);
        }

        let speeds: Vec<f64> = v2.iter().map(|v| v.sqrt()).collect();
        let mut time = 0.;
        let mut waypoints = Vec::with_capacity(samples.len());
        for (k, position) in samples.iter().enumerate() {
            if k > 0 {
                let sum = speeds[k - 1] + speeds[k];
                time += if sum > 1e-9 {
                    2. * ds[k - 1] / sum
                } else {
                    // Rest to rest over a single short step
                    2. * (ds[k - 1] / accel).sqrt()
                };
            }
            waypoints.push(Waypoint {
                position: *position,
                heading: if k == last { goal_heading } else { None },
                time,
                speed: speeds[k],
            });
        }
        Path { waypoints }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn start(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn end(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    pub fn duration(&self) -> f64 {
        self.end().map_or(0., |w| w.time)
    }

    pub fn length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| (w[1].position - w[0].position).norm())
            .sum()
    }

    /// Where the robot should be `t` seconds after the path started.
    pub fn position_at(&self, t: f64) -> Option<Point> {
        let first = self.waypoints.first()?;
        if t <= first.time {
            return Some(first.position);
        }
        for w in self.waypoints.windows(2) {
            if t <= w[1].time {
                let span = w[1].time - w[0].time;
                let f = if span > 0. { (t - w[0].time) / span } else { 1. };
                return Some(w[0].position + (w[1].position - w[0].position) * f);
            }
        }
        self.end().map(|w| w.position)
    }

    /// The rest of the path from the waypoint closest to `position`, re-timed to start
    /// now. `None` if the robot is further than `max_offset` from every waypoint.
    pub fn remaining_from(&self, position: &Point, max_offset: f64) -> Option<Path> {
        let (idx, dist) = self
            .waypoints
            .iter()
            .enumerate()
            .map(|(i, w)| (i, (w.position - position).norm()))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if dist > max_offset {
            return None;
        }
        let t0 = self.waypoints[idx].time;
        Some(Path {
            waypoints: self.waypoints[idx..]
                .iter()
                .map(|w| Waypoint {
                    time: w.time - t0,
                    ..*w
                })
                .collect(),
        })
    }

    pub fn hits(&self, obstacles: &ShapeSet) -> bool {
        match self.waypoints.as_slice() {
            [single] => obstacles.hit_point(&single.position),
            waypoints => waypoints
                .windows(2)
                .any(|w| obstacles.hit_segment(&w[0].position, &w[1].position)),
        }
    }
}
