use crate::geometry::{Point, ShapeSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeNode {
    pub position: Point,
    pub parent: Option<usize>,
}

/// A tree that grows in fixed-length steps. Lives for a single planning call.
#[derive(Debug, Clone)]
pub struct PlannerTree {
    nodes: Vec<TreeNode>,
    step_size: f64,
}

impl PlannerTree {
    pub fn new(root: Point, step_size: f64) -> Self {
        Self {
            nodes: vec![TreeNode {
                position: root,
                parent: None,
            }],
            step_size,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn nearest(&self, p: &Point) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, node) in self.nodes.iter().enumerate() {
            let d = (node.position - p).norm_squared();
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        best
    }

    pub fn add(&mut self, position: Point, parent: usize) -> usize {
        self.nodes.push(TreeNode {
            position,
            parent: Some(parent),
        });
        self.nodes.len() - 1
    }

    /// Take one step from the nearest node towards `target`. Returns the new node, or
    /// `None` when the step would run into an obstacle.
    pub fn extend(&mut self, target: &Point, obstacles: &ShapeSet) -> Option<usize> {
        let from = self.nearest(target);
        let origin = self.nodes[from].position;
        let delta = target - origin;
        let dist = delta.norm();
        if dist < 1e-9 {
            return None;
        }
        let next = if dist <= self.step_size {
            *target
        } else {
            origin + delta * (self.step_size / dist)
        };
        if obstacles.hit_segment(&origin, &next) {
            return None;
        }
        Some(self.add(next, from))
    }

    /// Points from the root to `idx`.
    pub fn path_to(&self, idx: usize) -> Vec<Point> {
        let mut points = vec![];
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            points.push(self.nodes[i].position);
            cursor = self.nodes[i].parent;
        }
        points.reverse();
        points
    }
}
