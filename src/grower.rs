//! Tree growth
//!
//! One tree is grown over a mutable row index. Splitting a node pivots its
//! slice of the index so each child owns a contiguous range, which is what
//! [`LeafRows`] hands back for leaf renewal. Three policies decide which
//! nodes get split:
//!
//! * `LeafWise` always splits the open leaf with the largest gain, until the
//!   leaf budget is spent.
//! * `DepthWise` splits every splittable node of a level before moving on.
//! * `Oblivious` applies a single shared split to every node of a level, so
//!   every root-to-leaf path tests the same sequence of conditions.
use crate::binning::BinnedData;
use crate::histogram::NodeHistogram;
use crate::splitter::{best_shared_split, best_split, NodeTotals, SplitInfo, SplitParams};
use crate::tree::{Node, Tree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GrowPolicy {
    LeafWise { max_leaves: usize, max_depth: Option<usize> },
    DepthWise { max_depth: usize },
    Oblivious { depth: usize },
}

/// Inputs shared by every node of one tree.
pub struct GrowContext<'a> {
    pub binned: &'a BinnedData,
    pub grad: &'a [f64],
    /// Features this tree may split on.
    pub col_index: &'a [usize],
    pub params: SplitParams,
}

/// Rows of a leaf: `index[start..stop]` of the index the tree was grown over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRows {
    pub node: usize,
    pub start: usize,
    pub stop: usize,
}

struct Candidate {
    node: usize,
    start: usize,
    stop: usize,
    depth: usize,
    totals: NodeTotals,
    hist: NodeHistogram,
    best: Option<SplitInfo>,
}

impl Candidate {
    fn rows(&self) -> LeafRows {
        LeafRows {
            node: self.node,
            start: self.start,
            stop: self.stop,
        }
    }

    fn find_best(&mut self, ctx: &GrowContext) {
        self.best = best_split(&self.hist, self.totals, &ctx.binned.cuts, ctx.col_index, &ctx.params);
    }
}

fn totals_of(rows: &[usize], grad: &[f64]) -> NodeTotals {
    NodeTotals {
        grad: rows.iter().map(|r| grad[*r]).sum(),
        count: rows.len() as u32,
    }
}

/// Move the rows going left to the front of `rows`, returning how many there are.
fn pivot(rows: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut n_left = 0;
    for i in 0..rows.len() {
        if goes_left(rows[i]) {
            rows.swap(n_left, i);
            n_left += 1;
        }
    }
    n_left
}

fn split_candidate(
    tree: &mut Tree,
    cand: Candidate,
    split: &SplitInfo,
    ctx: &GrowContext,
    index: &mut [usize],
) -> (Candidate, Candidate) {
    let bins = ctx.binned.get_col(split.feature);
    let n_left = pivot(&mut index[cand.start..cand.stop], |r| split.goes_left(bins[r]));
    let mid = cand.start + n_left;
    let left_rows = &index[cand.start..mid];
    let right_rows = &index[mid..cand.stop];

    // Only the smaller child is scanned.
    let (left_hist, right_hist) = if left_rows.len() <= right_rows.len() {
        let l = NodeHistogram::build(ctx.binned, left_rows, ctx.grad, ctx.col_index);
        let r = NodeHistogram::from_parent_child(&cand.hist, &l);
        (l, r)
    } else {
        let r = NodeHistogram::build(ctx.binned, right_rows, ctx.grad, ctx.col_index);
        let l = NodeHistogram::from_parent_child(&cand.hist, &r);
        (l, r)
    };
    let left_totals = totals_of(left_rows, ctx.grad);
    let right_totals = totals_of(right_rows, ctx.grad);

    let depth = cand.depth + 1;
    let left_num = tree.nodes.len();
    let right_num = left_num + 1;
    tree.nodes.push(Node::leaf(left_num, depth, left_rows.len()));
    tree.nodes.push(Node::leaf(right_num, depth, right_rows.len()));
    let parent = &mut tree.nodes[cand.node];
    parent.is_leaf = false;
    parent.split_feature = split.feature;
    parent.split_value = split.threshold;
    parent.split_gain = split.gain;
    parent.missing_left = split.missing_left;
    parent.left_child = left_num;
    parent.right_child = right_num;
    tree.depth = tree.depth.max(depth);

    let left = Candidate {
        node: left_num,
        start: cand.start,
        stop: mid,
        depth,
        totals: left_totals,
        hist: left_hist,
        best: None,
    };
    let right = Candidate {
        node: right_num,
        start: mid,
        stop: cand.stop,
        depth,
        totals: right_totals,
        hist: right_hist,
        best: None,
    };
    (left, right)
}

/// Grow one tree over `index` under `policy`.
///
/// Returns the tree, with leaf weights left at zero, and the rows of every leaf.
pub fn grow_tree(policy: &GrowPolicy, ctx: &GrowContext, index: &mut [usize]) -> (Tree, Vec<LeafRows>) {
    let mut tree = Tree {
        nodes: vec![Node::leaf(0, 0, index.len())],
        depth: 0,
    };
    let root = Candidate {
        node: 0,
        start: 0,
        stop: index.len(),
        depth: 0,
        totals: totals_of(index, ctx.grad),
        hist: NodeHistogram::build(ctx.binned, index, ctx.grad, ctx.col_index),
        best: None,
    };
    let leaves = match *policy {
        GrowPolicy::LeafWise { max_leaves, max_depth } => {
            grow_leaf_wise(&mut tree, root, max_leaves, max_depth, ctx, index)
        }
        GrowPolicy::DepthWise { max_depth } => grow_depth_wise(&mut tree, root, max_depth, ctx, index),
        GrowPolicy::Oblivious { depth } => grow_oblivious(&mut tree, root, depth, ctx, index),
    };
    (tree, leaves)
}

fn grow_leaf_wise(
    tree: &mut Tree,
    mut root: Candidate,
    max_leaves: usize,
    max_depth: Option<usize>,
    ctx: &GrowContext,
    index: &mut [usize],
) -> Vec<LeafRows> {
    let can_split = |depth: usize| max_depth.map_or(true, |d| depth < d);
    if can_split(0) {
        root.find_best(ctx);
    }
    let mut open = vec![root];
    let mut n_leaves = 1;
    while n_leaves < max_leaves {
        let next = open
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.best.map(|s| (i, s)))
            .max_by(|a, b| a.1.gain.total_cmp(&b.1.gain));
        let Some((pos, split)) = next else {
            break;
        };
        let cand = open.swap_remove(pos);
        let (mut left, mut right) = split_candidate(tree, cand, &split, ctx, index);
        for child in [&mut left, &mut right] {
            if can_split(child.depth) {
                child.find_best(ctx);
            }
        }
        open.push(left);
        open.push(right);
        n_leaves += 1;
    }
    open.iter().map(Candidate::rows).collect()
}

fn grow_depth_wise(
    tree: &mut Tree,
    mut root: Candidate,
    max_depth: usize,
    ctx: &GrowContext,
    index: &mut [usize],
) -> Vec<LeafRows> {
    let mut leaves = Vec::new();
    if max_depth > 0 {
        root.find_best(ctx);
    }
    let mut level = vec![root];
    while !level.is_empty() {
        let mut next = Vec::with_capacity(level.len() * 2);
        for cand in level {
            match cand.best {
                Some(split) => {
                    let (mut left, mut right) = split_candidate(tree, cand, &split, ctx, index);
                    if left.depth < max_depth {
                        left.find_best(ctx);
                        right.find_best(ctx);
                    }
                    next.push(left);
                    next.push(right);
                }
                None => leaves.push(cand.rows()),
            }
        }
        level = next;
    }
    leaves
}

fn grow_oblivious(
    tree: &mut Tree,
    root: Candidate,
    depth: usize,
    ctx: &GrowContext,
    index: &mut [usize],
) -> Vec<LeafRows> {
    let mut level = vec![root];
    for _ in 0..depth {
        let split = {
            let hists: Vec<&NodeHistogram> = level.iter().map(|c| &c.hist).collect();
            let totals: Vec<NodeTotals> = level.iter().map(|c| c.totals).collect();
            best_shared_split(&hists, &totals, &ctx.binned.cuts, ctx.col_index, &ctx.params)
        };
        let Some(split) = split else {
            break;
        };
        let mut next = Vec::with_capacity(level.len() * 2);
        for cand in level {
            let (left, right) = split_candidate(tree, cand, &split, ctx, index);
            next.push(left);
            next.push(right);
        }
        level = next;
    }
    level.iter().map(Candidate::rows).collect()
}
