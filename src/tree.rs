use crate::error::{Error, Result};
use crate::geometry::Shape;

/// A split on the difference between two sampled pixel intensities.
///
/// `idx1` and `idx2` index into the feature vector of the cascade stage that
/// owns the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub idx1: u32,
    pub idx2: u32,
    pub threshold: f32,
}

/// A complete binary regression tree stored in breadth-first order.
///
/// Split `i` has children `2i + 1` and `2i + 2`. Any child index at or past
/// `splits.len()` addresses leaf `child - splits.len()`.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    splits: Vec<Split>,
    leaves: Vec<Shape>,
}

impl RegressionTree {
    pub fn new(splits: Vec<Split>, leaves: Vec<Shape>) -> Result<Self> {
        if leaves.len() != splits.len() + 1 {
            return Err(Error::InvalidModel(format!(
                "tree with {} splits needs {} leaves, got {}",
                splits.len(),
                splits.len() + 1,
                leaves.len()
            )));
        }
        Ok(Self { splits, leaves })
    }

    /// A tree with no splits that always yields `delta`.
    pub fn leaf(delta: Shape) -> Self {
        Self {
            splits: Vec::new(),
            leaves: vec![delta],
        }
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// Walk the tree over the sampled intensities and return the leaf delta.
    ///
    /// Goes left when `features[idx1] - features[idx2] > threshold`.
    pub fn predict(&self, features: &[f32]) -> &Shape {
        let mut node = 0usize;
        while let Some(split) = self.splits.get(node) {
            let diff = features[split.idx1 as usize] - features[split.idx2 as usize];
            node = if diff > split.threshold {
                2 * node + 1
            } else {
                2 * node + 2
            };
        }
        &self.leaves[node - self.splits.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn one_point(x: f32) -> Shape {
        Shape::new(vec![Point::new(x, x)])
    }

    #[test]
    fn single_split_routes_on_difference() {
        let tree = RegressionTree::new(
            vec![Split {
                idx1: 0,
                idx2: 1,
                threshold: 50.0,
            }],
            vec![one_point(-0.1), one_point(0.1)],
        )
        .unwrap();

        assert_eq!(tree.predict(&[200.0, 100.0])[0].x, -0.1);
        assert_eq!(tree.predict(&[120.0, 100.0])[0].x, 0.1);
        // Equal to the threshold is not "greater than".
        assert_eq!(tree.predict(&[150.0, 100.0])[0].x, 0.1);
    }

    #[test]
    fn depth_two_tree_reaches_every_leaf() {
        let split = |idx1, idx2| Split {
            idx1,
            idx2,
            threshold: 0.0,
        };
        let tree = RegressionTree::new(
            vec![split(0, 1), split(2, 3), split(3, 2)],
            (0..4).map(|i| one_point(i as f32)).collect(),
        )
        .unwrap();

        assert_eq!(tree.predict(&[1.0, 0.0, 1.0, 0.0])[0].x, 0.0);
        assert_eq!(tree.predict(&[1.0, 0.0, 0.0, 1.0])[0].x, 1.0);
        assert_eq!(tree.predict(&[0.0, 1.0, 0.0, 1.0])[0].x, 2.0);
        assert_eq!(tree.predict(&[0.0, 1.0, 1.0, 0.0])[0].x, 3.0);
    }

    #[test]
    fn leaf_count_is_validated() {
        let err = RegressionTree::new(
            vec![Split {
                idx1: 0,
                idx2: 0,
                threshold: 0.0,
            }],
            vec![one_point(0.0)],
        );
        assert!(matches!(err, Err(Error::InvalidModel(_))));
    }

    #[test]
    fn leaf_only_tree() {
        let tree = RegressionTree::leaf(one_point(0.5));
        assert_eq!(tree.predict(&[])[0].y, 0.5);
    }
}
