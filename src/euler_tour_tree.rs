use std::{collections::BTreeMap, marker::PhantomData};

use derivative::Derivative;

use crate::{
    lists::{splay::Splays, AggregatedData, Idx, Lists, SearchData, SearchDirection},
    monoid::MonoidOperator,
};

/// One position in an Euler tour.
#[derive(Debug, Clone)]
pub enum TourNode<V> {
    Vertex {
        id: usize,
        value: V,
        /// Carries at least one non tree edge on this level.
        non_tree: bool,
    },
    /// Directed arc of a tree edge.
    Arc {
        from: usize,
        to: usize,
        /// Tree edge of this level not yet promoted. Only one of the two arcs carries it.
        exact: bool,
    },
}

impl<V> TourNode<V> {
    /// The pair identifying this node, (id, id) for vertices.
    pub fn ends(&self) -> (usize, usize) {
        match self {
            TourNode::Vertex { id, .. } => (*id, *id),
            TourNode::Arc { from, to, .. } => (*from, *to),
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct TourAgg<M: MonoidOperator> {
    /// Monoid aggregate of the vertex values.
    pub sum: M::Value,
    /// Number of vertex nodes.
    pub vertices: usize,
    /// Some arc is exact.
    pub has_exact: bool,
    /// Some vertex carries a non tree edge.
    pub has_non_tree: bool,
}

impl<M: MonoidOperator> Default for TourAgg<M> {
    fn default() -> Self {
        Self {
            sum: M::identity(),
            vertices: 0,
            has_exact: false,
            has_non_tree: false,
        }
    }
}

impl<M: MonoidOperator> AggregatedData for TourAgg<M> {
    type Data = TourNode<M::Value>;
    fn from(data: &Self::Data) -> Self {
        match data {
            TourNode::Vertex {
                value, non_tree, ..
            } => Self {
                sum: value.clone(),
                vertices: 1,
                has_exact: false,
                has_non_tree: *non_tree,
            },
            TourNode::Arc { exact, .. } => Self {
                has_exact: *exact,
                ..Self::default()
            },
        }
    }
    fn merge(self, right: Self) -> Self {
        Self {
            sum: M::operate(&self.sum, &right.sum),
            vertices: self.vertices + right.vertices,
            has_exact: self.has_exact || right.has_exact,
            has_non_tree: self.has_non_tree || right.has_non_tree,
        }
    }
}

pub(crate) fn alg_panic() -> ! {
    panic!("EulerTourTree algorithm incorrect")
}
pub(crate) fn or_alg_panic<T>(opt: Option<T>) -> T {
    opt.unwrap_or_else(|| alg_panic())
}

/// A spanning forest over vertices `0..n`, each tree stored as its Euler tour in `L`.
///
/// Vertex `v` is node `v` of the lists. Each tree edge `{u, v}` owns the two arc nodes `(u, v)`
/// and `(v, u)`, so a tree with k vertices is a list of 2k - 1 nodes.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct EulerTourForest<M, L = Splays<TourAgg<M>>>
where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    lists: L,
    n: usize,
    /// Arc nodes of every tree edge, in both directions.
    arcs: BTreeMap<(usize, usize), Idx>,
    #[derivative(Debug = "ignore")]
    _phantom: PhantomData<M>,
}

impl<M, L> EulerTourForest<M, L>
where
    M: MonoidOperator,
    L: Lists<TourAgg<M>>,
{
    /// Forest with n isolated vertices, all with the identity value.
    pub fn new(n: usize) -> Self {
        let mut lists = L::new(2 * n);
        for v in 0..n {
            let idx = lists.create(TourNode::Vertex {
                id: v,
                value: M::identity(),
                non_tree: false,
            });
            assert_eq!(idx, v);
        }
        Self {
            lists,
            n,
            arcs: BTreeMap::new(),
            _phantom: PhantomData,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.n
    }

    /// Number of vertex and arc nodes over all tours.
    pub fn total_size(&self) -> usize {
        self.lists.total_size()
    }

    /// Makes v the first node of its tour.
    fn reroot(&mut self, v: usize) {
        let k = self.lists.order(v);
        if k == 0 {
            return;
        }
        let (before, from_v, _) = self.lists.split(v, k..);
        self.lists.concat(from_v, before);
    }

    /// Adds the tree edge {u, v}. Returns false, changing nothing, if they are already connected.
    pub fn link(&mut self, u: usize, v: usize) -> bool {
        self.link_inner(u, v, true)
    }

    /// Like `link`, choosing whether the new edge is exact on this level.
    pub(crate) fn link_inner(&mut self, u: usize, v: usize, exact: bool) -> bool {
        if self.same_tree(u, v) {
            return false;
        }
        self.reroot(u);
        self.reroot(v);
        let uv = self.lists.create(TourNode::Arc {
            from: u,
            to: v,
            exact: exact && u < v,
        });
        let vu = self.lists.create(TourNode::Arc {
            from: v,
            to: u,
            exact: exact && v < u,
        });
        self.arcs.insert((u, v), uv);
        self.arcs.insert((v, u), vu);
        self.lists.concat_all([u, uv, v, vu]);
        log::trace!("linked {u} {v} (exact: {exact})");
        true
    }

    /// Whether {u, v} is a tree edge of this forest.
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.arcs.contains_key(&(u, v))
    }

    /// Whether the edge {u, v} is exact on this level.
    fn is_exact(&self, u: usize, v: usize) -> bool {
        let key = (u.min(v), u.max(v));
        self.arcs.get(&key).is_some_and(|&idx| {
            matches!(self.lists.data(idx), TourNode::Arc { exact: true, .. })
        })
    }

    /// Removes the tree edge {u, v}. Returns false if it isn't one.
    pub fn cut(&mut self, u: usize, v: usize) -> bool {
        let (Some(&uv), Some(&vu)) = (self.arcs.get(&(u, v)), self.arcs.get(&(v, u))) else {
            return false;
        };
        let (mut a, mut b) = (uv, vu);
        let (mut oa, mut ob) = (self.lists.order(a), self.lists.order(b));
        if oa > ob {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut oa, &mut ob);
        }
        // [left] a [inner] b [right] becomes [left right] and [inner]
        let (left, middle, right) = self.lists.split(a, oa..=ob);
        let middle_len = ob - oa + 1;
        self.lists.split(middle, 1..middle_len - 1);
        assert_eq!(self.lists.len(a), 1);
        assert_eq!(self.lists.len(b), 1);
        self.lists.concat(left, right);
        self.lists.free(a);
        self.lists.free(b);
        self.arcs.remove(&(u, v));
        self.arcs.remove(&(v, u));
        log::trace!("cut {u} {v}");
        true
    }

    pub fn same_tree(&mut self, u: usize, v: usize) -> bool {
        self.lists.on_same_list(u, v)
    }

    /// Number of vertices in the tree containing v.
    pub fn tree_size(&mut self, v: usize) -> usize {
        self.lists.total_agg(v).vertices
    }

    /// Value directly assigned to v.
    pub fn value(&self, v: usize) -> M::Value {
        match self.lists.data(v) {
            TourNode::Vertex { value, .. } => value.clone(),
            TourNode::Arc { .. } => alg_panic(),
        }
    }

    fn mutate_value(&mut self, v: usize, f: impl FnOnce(&mut M::Value)) {
        self.lists.mutate_data(v, |data| match data {
            TourNode::Vertex { value, .. } => f(value),
            TourNode::Arc { .. } => alg_panic(),
        });
    }

    /// Overwrites the value of v.
    pub fn set_value(&mut self, v: usize, x: M::Value) {
        self.mutate_value(v, |value| *value = x);
    }

    /// Combines the value of v with x, as `operate(value, x)`.
    pub fn update_value(&mut self, v: usize, x: M::Value) {
        self.mutate_value(v, |value| *value = M::operate(value, &x));
    }

    /// Aggregate of the values of the tree containing v.
    pub fn component_sum(&mut self, v: usize) -> M::Value {
        self.lists.total_agg(v).sum
    }

    /// Aggregate of the tree containing v if the edge {u, v} were removed.
    pub fn sum_across_cut(&mut self, u: usize, v: usize) -> M::Value {
        if !self.has_edge(u, v) {
            return self.component_sum(v);
        }
        let exact = self.is_exact(u, v);
        self.cut(u, v);
        let sum = self.component_sum(v);
        if !self.link_inner(u, v, exact) {
            alg_panic();
        }
        sum
    }

    /// Every vertex in the tree containing v, in tour order.
    pub fn vertices(&mut self, v: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.lists.for_each(v, |_, data| {
            if let TourNode::Vertex { id, .. } = data {
                out.push(*id);
            }
        });
        out
    }

    /// The Euler tour containing v, as node pairs.
    pub fn tour(&mut self, v: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.lists.for_each(v, |_, data| out.push(data.ends()));
        out
    }

    /// Finds some exact arc on the tree of v, clears its flag and returns its ends.
    pub fn pop_exact_edge(&mut self, v: usize) -> Option<(usize, usize)> {
        let found = self
            .lists
            .find_element(v, |s: SearchData<'_, TourAgg<M>>| {
                if s.left_agg.has_exact {
                    SearchDirection::Left
                } else if matches!(s.current_data, TourNode::Arc { exact: true, .. }) {
                    SearchDirection::Found
                } else if s.right_agg.has_exact {
                    SearchDirection::Right
                } else {
                    SearchDirection::NotFound
                }
            });
        if found == L::EMPTY {
            return None;
        }
        let mut ends = None;
        self.lists.mutate_data(found, |data| {
            if let TourNode::Arc { from, to, exact } = data {
                *exact = false;
                ends = Some((*from, *to));
            }
        });
        Some(or_alg_panic(ends))
    }

    /// Calls visit on each exact edge of the tree of v, clearing the flags.
    pub fn drain_exact_edges(&mut self, v: usize, mut visit: impl FnMut(usize, usize)) {
        while let Some((a, b)) = self.pop_exact_edge(v) {
            visit(a, b);
        }
    }

    /// Finds some vertex on the tree of v carrying a non tree edge.
    pub fn find_non_tree_vertex(&mut self, v: usize) -> Option<usize> {
        let found = self
            .lists
            .find_element(v, |s: SearchData<'_, TourAgg<M>>| {
                if s.left_agg.has_non_tree {
                    SearchDirection::Left
                } else if matches!(s.current_data, TourNode::Vertex { non_tree: true, .. }) {
                    SearchDirection::Found
                } else if s.right_agg.has_non_tree {
                    SearchDirection::Right
                } else {
                    SearchDirection::NotFound
                }
            });
        (found != L::EMPTY).then_some(found)
    }

    /// Repeatedly calls visit on a vertex of v's tree carrying a non tree edge, stopping when
    /// visit returns true. A visit returning false must clear the flag of the vertex it was given.
    pub fn find_non_tree_connected(
        &mut self,
        v: usize,
        mut visit: impl FnMut(&mut Self, usize) -> bool,
    ) -> bool {
        while let Some(x) = self.find_non_tree_vertex(v) {
            if visit(self, x) {
                return true;
            }
            assert!(!self.non_tree_flag(x), "visit didn't clear the flag of {x}");
        }
        false
    }

    pub fn non_tree_flag(&self, v: usize) -> bool {
        matches!(self.lists.data(v), TourNode::Vertex { non_tree: true, .. })
    }

    pub fn set_non_tree_flag(&mut self, v: usize, flag: bool) {
        self.lists.mutate_data(v, |data| match data {
            TourNode::Vertex { non_tree, .. } => *non_tree = flag,
            TourNode::Arc { .. } => alg_panic(),
        });
    }
}
