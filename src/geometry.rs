//! Minimal planar geometry used by the planner and the skills.

use nalgebra::Vector2;

pub type Point = Vector2<f64>;

pub fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

pub fn is_finite(p: &Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Wrap an angle into `(-pi, pi]`.
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::PI;
    let a = (angle + PI).rem_euclid(2. * PI) - PI;
    if a <= -PI {
        a + 2. * PI
    } else {
        a
    }
}

pub fn angle_of(v: &Point) -> f64 {
    v.y.atan2(v.x)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn segment_distance(a: &Point, b: &Point, p: &Point) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-18 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0., 1.);
    (a + ab * t - p).norm()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point,
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: point(x, y),
            heading,
        }
    }

    pub fn at(position: Point, heading: f64) -> Self {
        Self { position, heading }
    }

    pub fn is_finite(&self) -> bool {
        is_finite(&self.position) && self.heading.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { center: Point, radius: f64 },
    /// Axis-aligned rectangle.
    Rect { min: Point, max: Point },
}

impl Shape {
    pub fn circle(center: Point, radius: f64) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn rect(a: Point, b: Point) -> Self {
        Shape::Rect {
            min: point(a.x.min(b.x), a.y.min(b.y)),
            max: point(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        match self {
            Shape::Circle { center, radius } => (p - center).norm() < *radius,
            Shape::Rect { min, max } => {
                min.x <= p.x && p.x <= max.x && min.y <= p.y && p.y <= max.y
            }
        }
    }

    pub fn hits_segment(&self, a: &Point, b: &Point) -> bool {
        match self {
            Shape::Circle { center, radius } => segment_distance(a, b, center) < *radius,
            Shape::Rect { min, max } => {
                // Liang-Barsky clipping against the four slabs
                let d = b - a;
                let mut t0 = 0.;
                let mut t1 = 1.;
                for (p, q) in [
                    (-d.x, a.x - min.x),
                    (d.x, max.x - a.x),
                    (-d.y, a.y - min.y),
                    (d.y, max.y - a.y),
                ] {
                    if p == 0. {
                        if q < 0. {
                            return false;
                        }
                    } else {
                        let r = q / p;
                        if p < 0. {
                            if r > t1 {
                                return false;
                            }
                            if r > t0 {
                                t0 = r;
                            }
                        } else {
                            if r < t0 {
                                return false;
                            }
                            if r < t1 {
                                t1 = r;
                            }
                        }
                    }
                }
                true
            }
        }
    }

    /// Grow the shape by `margin` in every direction.
    pub fn inflate(&self, margin: f64) -> Shape {
        match *self {
            Shape::Circle { center, radius } => Shape::Circle {
                center,
                radius: (radius + margin).max(0.),
            },
            Shape::Rect { min, max } => Shape::Rect {
                min: point(min.x - margin, min.y - margin),
                max: point(max.x + margin, max.y + margin),
            },
        }
    }

    /// Whether two shapes are the same kind and no vertex moved more than `tolerance`.
    pub fn approx_eq(&self, other: &Shape, tolerance: f64) -> bool {
        match (self, other) {
            (
                Shape::Circle { center, radius },
                Shape::Circle {
                    center: c2,
                    radius: r2,
                },
            ) => (center - c2).norm() <= tolerance && (radius - r2).abs() <= tolerance,
            (Shape::Rect { min, max }, Shape::Rect { min: m2, max: x2 }) => {
                (min - m2).norm() <= tolerance && (max - x2).norm() <= tolerance
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeSet {
    shapes: Vec<Shape>,
}

impl ShapeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn hit_point(&self, p: &Point) -> bool {
        self.shapes.iter().any(|s| s.contains(p))
    }

    pub fn hit_segment(&self, a: &Point, b: &Point) -> bool {
        self.shapes.iter().any(|s| s.hits_segment(a, b))
    }

    /// Drop every shape that contains `p`.
    pub fn without_containing(&self, p: &Point) -> ShapeSet {
        ShapeSet {
            shapes: self.shapes.iter().filter(|s| !s.contains(p)).copied().collect(),
        }
    }

    pub fn approx_eq(&self, other: &ShapeSet, tolerance: f64) -> bool {
        self.shapes.len() == other.shapes.len()
            && self
                .shapes
                .iter()
                .zip(&other.shapes)
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }
}

impl FromIterator<Shape> for ShapeSet {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod test;
