use crate::data::Matrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub num: usize,
    pub weight_value: f64,
    pub depth: usize,
    pub count: usize,
    pub split_value: f64,
    pub split_feature: usize,
    pub split_gain: f64,
    pub missing_left: bool,
    pub left_child: usize,
    pub right_child: usize,
    pub is_leaf: bool,
}

impl Node {
    pub fn leaf(num: usize, depth: usize, count: usize) -> Self {
        Node {
            num,
            weight_value: 0.0,
            depth,
            count,
            split_value: f64::NAN,
            split_feature: 0,
            split_gain: 0.0,
            missing_left: false,
            left_child: 0,
            right_child: 0,
            is_leaf: true,
        }
    }

    /// Get the path that should be traveled down, given a value.
    #[inline]
    pub fn get_child_idx(&self, v: f64) -> usize {
        if v.is_nan() {
            if self.missing_left {
                self.left_child
            } else {
                self.right_child
            }
        } else if v < self.split_value {
            self.left_child
        } else {
            self.right_child
        }
    }
}

/// A regression tree stored as a flat node list, root first.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub depth: usize,
}

impl Tree {
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    pub fn predict_row(&self, data: &Matrix<f64>, row: usize) -> f64 {
        let mut node_idx = 0;
        loop {
            let node = &self.nodes[node_idx];
            if node.is_leaf {
                return node.weight_value;
            }
            node_idx = node.get_child_idx(*data.get(row, node.split_feature));
        }
    }

    pub fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Vec<f64> {
        if parallel {
            data.index.par_iter().map(|row| self.predict_row(data, *row)).collect()
        } else {
            data.index.iter().map(|row| self.predict_row(data, *row)).collect()
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            let indent = "      ".repeat(node.depth);
            if node.is_leaf {
                writeln!(f, "{}{}:leaf={:.4},cover={}", indent, node.num, node.weight_value, node.count)?;
            } else {
                writeln!(
                    f,
                    "{}{}:[{} < {}] yes={},no={},missing={},gain={:.4},cover={}",
                    indent,
                    node.num,
                    node.split_feature,
                    node.split_value,
                    node.left_child,
                    node.right_child,
                    if node.missing_left { node.left_child } else { node.right_child },
                    node.split_gain,
                    node.count,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        let mut root = Node::leaf(0, 0, 4);
        root.is_leaf = false;
        root.split_feature = 1;
        root.split_value = 10.0;
        root.missing_left = true;
        root.left_child = 1;
        root.right_child = 2;
        let mut left = Node::leaf(1, 1, 2);
        left.weight_value = -1.0;
        let mut right = Node::leaf(2, 1, 2);
        right.weight_value = 1.0;
        Tree {
            nodes: vec![root, left, right],
            depth: 1,
        }
    }

    #[test]
    fn test_predict_routes_rows() {
        let data_vec = vec![0.0, 0.0, 0.0, 5.0, 10.0, f64::NAN];
        let data = Matrix::new(&data_vec, 3, 2);
        let tree = stump();
        assert_eq!(tree.predict(&data, false), vec![-1.0, 1.0, -1.0]);
        assert_eq!(tree.predict(&data, true), vec![-1.0, 1.0, -1.0]);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_display() {
        let s = format!("{}", stump());
        assert!(s.starts_with("0:[1 < 10] yes=1,no=2,missing=1"));
        assert_eq!(s.lines().count(), 3);
    }
}
