use std::collections::BTreeSet;

use derivative::Derivative;

use crate::{
    euler_tour_tree::{alg_panic, EulerTourForest, TourAgg},
    lists::{splay::Splays, Lists},
    monoid::MonoidOperator,
};

pub trait DynamicConnectivitySolver {
    /// New instance for an empty graph on n nodes
    fn new(n: usize) -> Self;
    /// Add an edge between u and v. Returns whether it connected two different components.
    fn link(&mut self, u: usize, v: usize) -> bool;
    /// Remove the edge between u and v. Returns whether it disconnected its component.
    fn cut(&mut self, u: usize, v: usize) -> bool;
    /// Check if u and v are connected.
    fn same_component(&mut self, u: usize, v: usize) -> bool;
    /// Number of vertices connected to v, including itself.
    fn component_size(&mut self, v: usize) -> usize;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("vertex {vertex} is out of range for a graph with {len} vertices")]
    VertexOutOfRange { vertex: usize, len: usize },
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
struct Level<M, L>
where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    /// Spanning forest of the edges with level at least this one.
    forest: EulerTourForest<M, L>,
    /// Non tree edges of exactly this level, as adjacency sets.
    non_tree: Vec<BTreeSet<usize>>,
}

impl<M, L> Level<M, L>
where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    fn new(n: usize) -> Self {
        Self {
            forest: EulerTourForest::new(n),
            non_tree: vec![BTreeSet::new(); n],
        }
    }
}

fn insert_non_tree<M, L>(
    forest: &mut EulerTourForest<M, L>,
    non_tree: &mut [BTreeSet<usize>],
    u: usize,
    v: usize,
) where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    for (a, b) in [(u, v), (v, u)] {
        if non_tree[a].insert(b) && non_tree[a].len() == 1 {
            forest.set_non_tree_flag(a, true);
        }
    }
}

fn remove_non_tree<M, L>(
    forest: &mut EulerTourForest<M, L>,
    non_tree: &mut [BTreeSet<usize>],
    u: usize,
    v: usize,
) where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    for (a, b) in [(u, v), (v, u)] {
        if non_tree[a].remove(&b) && non_tree[a].is_empty() {
            forest.set_non_tree_flag(a, false);
        }
    }
}

/// Fully dynamic connectivity on a fixed set of vertices, with monoid aggregates per component.
///
/// Uses the level scheme of Holm, de Lichtenberg and Thorup: each edge has a level that only
/// increases, forest `i` spans the tree edges of level at least `i`, and deleting a tree edge
/// searches for a replacement from its level down, promoting everything on the smaller side.
/// All operations are amortized polylogarithmic.
///
/// Level 0 spans the whole graph, so every query is answered there.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct DynamicConnectivity<M, L = Splays<TourAgg<M>>>
where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    n: usize,
    levels: Vec<Level<M, L>>,
}

impl<M, L> DynamicConnectivity<M, L>
where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    /// Graph with n vertices, no edges, and all values equal to the identity.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            levels: vec![Level::new(n)],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.n
    }

    /// Number of levels currently allocated.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    fn contains(&self, v: usize) -> bool {
        v < self.n
    }

    fn check(&self, v: usize) -> Result<(), Error> {
        if self.contains(v) {
            Ok(())
        } else {
            Err(Error::VertexOutOfRange {
                vertex: v,
                len: self.n,
            })
        }
    }

    fn level0(&mut self) -> &mut EulerTourForest<M, L> {
        &mut self.levels[0].forest
    }

    /// Adds the edge {u, v}. Returns true if it joined two components, false if u and v were
    /// already connected (the edge is then kept as a replacement candidate) or the edge is invalid.
    pub fn link(&mut self, u: usize, v: usize) -> bool {
        if u == v || !self.contains(u) || !self.contains(v) {
            return false;
        }
        if self.level0().link(u, v) {
            return true;
        }
        let Level { forest, non_tree } = &mut self.levels[0];
        insert_non_tree(forest, non_tree, u, v);
        false
    }

    /// Removes the edge {u, v}. Returns true if this disconnected u from v.
    pub fn cut(&mut self, u: usize, v: usize) -> bool {
        if u == v || !self.contains(u) || !self.contains(v) {
            return false;
        }
        for Level { forest, non_tree } in self.levels.iter_mut() {
            remove_non_tree(forest, non_tree, u, v);
        }
        let Some(k) = self.edge_level(u, v) else {
            return false;
        };
        for level in &mut self.levels[..=k] {
            if !level.forest.cut(u, v) {
                alg_panic();
            }
        }
        if k + 1 == self.levels.len() {
            self.levels.push(Level::new(self.n));
            log::debug!("now using {} levels", self.levels.len());
        }
        !self.try_reconnect(u, v, k)
    }

    /// After the tree edge {u, v} of level k was cut, looks for a non tree edge joining both sides.
    fn try_reconnect(&mut self, mut u: usize, mut v: usize, k: usize) -> bool {
        for i in (0..=k).rev() {
            let (lower, rest) = self.levels.split_at_mut(i);
            let [Level { forest, non_tree }, next, ..] = rest else {
                alg_panic();
            };
            if forest.tree_size(u) > forest.tree_size(v) {
                std::mem::swap(&mut u, &mut v);
            }
            // The smaller side becomes a tree of level i + 1.
            forest.drain_exact_edges(u, |a, b| {
                log::trace!("promote {a} {b} to level {}", i + 1);
                assert!(
                    next.forest.link(a, b),
                    "{a} and {b} were already connected on level {}",
                    i + 1
                );
            });
            let found = forest.find_non_tree_connected(u, |forest, x| {
                let neighbours: Vec<usize> = non_tree[x].iter().copied().collect();
                for y in neighbours {
                    remove_non_tree(forest, non_tree, x, y);
                    if forest.same_tree(x, y) {
                        log::trace!("non tree edge {x} {y} moves to level {}", i + 1);
                        insert_non_tree(&mut next.forest, &mut next.non_tree, x, y);
                    } else {
                        log::debug!("replacement edge {x} {y} on level {i}");
                        if !forest.link(x, y) {
                            alg_panic();
                        }
                        for level in lower.iter_mut() {
                            if !level.forest.link_inner(x, y, false) {
                                alg_panic();
                            }
                        }
                        return true;
                    }
                }
                false
            });
            if found {
                return true;
            }
        }
        false
    }

    /// Deepest level where {u, v} is a tree edge, or None if it isn't one.
    pub fn edge_level(&self, u: usize, v: usize) -> Option<usize> {
        if !self.contains(u) || !self.contains(v) {
            return None;
        }
        (0..self.levels.len())
            .rev()
            .find(|&i| self.levels[i].forest.has_edge(u, v))
    }

    pub fn same_component(&mut self, u: usize, v: usize) -> bool {
        self.contains(u) && self.contains(v) && self.level0().same_tree(u, v)
    }

    /// Number of vertices in the component of v, 0 if v is invalid.
    pub fn component_size(&mut self, v: usize) -> usize {
        if !self.contains(v) {
            return 0;
        }
        self.level0().tree_size(v)
    }

    /// Overwrites the value of v.
    pub fn set_value(&mut self, v: usize, x: M::Value) -> Result<(), Error> {
        self.check(v)?;
        self.level0().set_value(v, x);
        Ok(())
    }

    /// Combines the value of v with x, as `operate(value, x)`.
    pub fn update_value(&mut self, v: usize, x: M::Value) -> Result<(), Error> {
        self.check(v)?;
        self.level0().update_value(v, x);
        Ok(())
    }

    /// Value of v, identity if v is invalid.
    pub fn get(&self, v: usize) -> M::Value {
        if !self.contains(v) {
            return M::identity();
        }
        self.levels[0].forest.value(v)
    }

    /// Aggregate of all values in the component of v, identity if v is invalid.
    pub fn get_sum(&mut self, v: usize) -> M::Value {
        if !self.contains(v) {
            return M::identity();
        }
        self.level0().component_sum(v)
    }

    /// All vertices in the component of v, in no particular order. Empty if v is invalid.
    pub fn get_vertices(&mut self, v: usize) -> Vec<usize> {
        if !self.contains(v) {
            return vec![];
        }
        self.level0().vertices(v)
    }

    /// Aggregate of v's side of the spanning forest if the tree edge {u, v} were removed.
    /// This is the whole component of v if {u, v} isn't a tree edge.
    pub fn sum_across_cut(&mut self, u: usize, v: usize) -> M::Value {
        if !self.contains(u) || !self.contains(v) {
            return M::identity();
        }
        self.level0().sum_across_cut(u, v)
    }
}

impl<M, L> DynamicConnectivitySolver for DynamicConnectivity<M, L>
where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    fn new(n: usize) -> Self {
        Self::new(n)
    }

    fn link(&mut self, u: usize, v: usize) -> bool {
        self.link(u, v)
    }

    fn cut(&mut self, u: usize, v: usize) -> bool {
        self.cut(u, v)
    }

    fn same_component(&mut self, u: usize, v: usize) -> bool {
        self.same_component(u, v)
    }

    fn component_size(&mut self, v: usize) -> usize {
        self.component_size(v)
    }
}
