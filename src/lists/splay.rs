use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

use debug_tree::{add_branch_to, AsTree, TreeBuilder};
use derivative::Derivative;

use super::{AggregatedData, Idx, Lists, SearchData, SearchDirection};

fn node_fmt(u: &Idx, f: &mut Formatter) -> std::fmt::Result {
    if *u == usize::MAX {
        write!(f, "∅")
    } else {
        write!(f, "{u}")
    }
}
fn node2_fmt([u, v]: &[Idx; 2], f: &mut Formatter) -> std::fmt::Result {
    write!(f, "[")?;
    node_fmt(u, f)?;
    write!(f, ", ")?;
    node_fmt(v, f)?;
    write!(f, "]")
}

/// Used to pretty print a Idx, outputting ∅ if it is EMPTY.
pub struct PrettyIdx(pub Idx);

impl Display for PrettyIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        node_fmt(&self.0, f)
    }
}

impl Debug for PrettyIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

use PrettyIdx as I;

const LEFT: usize = 0;
const RIGHT: usize = 1;

#[derive(Derivative)]
#[derivative(Debug)]
struct Node<Ag: AggregatedData> {
    #[derivative(Debug(format_with = "node_fmt"))]
    parent: Idx,
    /// Left and right child
    #[derivative(Debug(format_with = "node2_fmt"))]
    child: [Idx; 2],
    /// Data for this node
    data: Ag::Data,
    /// Aggregated data for this node's subtree
    ag_data: Ag,
    size: usize,
}

impl<Ag: AggregatedData> Node<Ag> {
    fn new(data: Ag::Data) -> Self {
        Self {
            ag_data: Ag::from(&data),
            data,
            child: [Splays::<Ag>::EMPTY; 2],
            parent: Splays::<Ag>::EMPTY,
            size: 1,
        }
    }
}

/// Lists stored as splay trees in a single arena. Every access splays the touched node,
/// so all operations are amortized O(log n).
pub struct Splays<Ag: AggregatedData = ()> {
    nodes: Vec<Node<Ag>>,
    /// Indices released by `free`, reused by `create`.
    free: Vec<Idx>,
}

impl<Ag: AggregatedData> Debug for Splays<Ag> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let builder = TreeBuilder::new();
        let _b = builder.add_branch("Splays");
        let free: BTreeSet<Idx> = self.free.iter().copied().collect();
        for u in 0..self.nodes.len() {
            if self.nodes[u].parent == Self::EMPTY && !free.contains(&u) {
                self.tree_inorder_dbg(u, &builder);
            }
        }
        writeln!(f, "{}", builder.string())
    }
}

impl<Ag: AggregatedData> Splays<Ag> {
    fn tree_inorder_dbg<T: AsTree>(&self, u: Idx, tree: &T) {
        let nu = &self.nodes[u];
        if nu.child[LEFT] != Self::EMPTY {
            add_branch_to!(*tree, "left child of {u}");
            self.tree_inorder_dbg(nu.child[LEFT], tree);
        }
        add_branch_to!(*tree, "[{u}] {nu:?}");
        if nu.child[RIGHT] != Self::EMPTY {
            self.tree_inorder_dbg(nu.child[RIGHT], tree);
        }
    }
    fn n(&self, u: Idx) -> Option<&Node<Ag>> {
        if u == Self::EMPTY {
            None
        } else {
            Some(&self.nodes[u])
        }
    }
    fn size(&self, u: Idx) -> usize {
        self.n(u).map_or(0, |n| n.size)
    }
    fn parent(&self, u: Idx) -> Idx {
        self.n(u).map_or(Self::EMPTY, |n| n.parent)
    }
    fn child(&self, u: Idx) -> [Idx; 2] {
        self.n(u).map_or([Self::EMPTY; 2], |n| n.child)
    }
    fn ag_data(&self, u: Idx) -> Ag {
        self.n(u).map_or_else(Ag::default, |n| n.ag_data.clone())
    }
    /// Which child of its parent u is. Panics if u is a root.
    fn side(&self, u: Idx) -> usize {
        let p = self.parent(u);
        assert_ne!(p, Self::EMPTY, "splay algorithm incorrect: {} has no parent", u);
        if self.nodes[p].child[LEFT] == u {
            LEFT
        } else {
            debug_assert_eq!(self.nodes[p].child[RIGHT], u);
            RIGHT
        }
    }
    // Call when children are changed. Empty children count as the identity.
    fn recalc(&mut self, u: Idx) {
        let [l, r] = self.nodes[u].child;
        self.nodes[u].size = self.size(l) + 1 + self.size(r);
        self.nodes[u].ag_data = self
            .ag_data(l)
            .merge(Ag::from(&self.nodes[u].data))
            .merge(self.ag_data(r));
    }
    fn attach(&mut self, p: Idx, side: usize, c: Idx) {
        self.nodes[p].child[side] = c;
        if c != Self::EMPTY {
            self.nodes[c].parent = p;
        }
    }
    /// Detaches a child of p, without recalculating p.
    fn detach(&mut self, p: Idx, side: usize) -> Idx {
        let c = std::mem::replace(&mut self.nodes[p].child[side], Self::EMPTY);
        if c != Self::EMPTY {
            self.nodes[c].parent = Self::EMPTY;
        }
        c
    }
    /// Swaps u with its parent, keeping the in-order sequence.
    fn rotate(&mut self, u: Idx) {
        let s = self.side(u);
        let p = self.nodes[u].parent;
        let g = self.nodes[p].parent;
        let inner = self.nodes[u].child[1 - s];
        self.attach(p, s, inner);
        self.attach(u, 1 - s, p);
        self.nodes[u].parent = g;
        if g != Self::EMPTY {
            let gs = if self.nodes[g].child[LEFT] == p {
                LEFT
            } else {
                RIGHT
            };
            self.nodes[g].child[gs] = u;
        }
        self.recalc(p);
        self.recalc(u);
    }
    /// Rotates u until it is the root of its tree.
    fn splay(&mut self, u: Idx) {
        while self.parent(u) != Self::EMPTY {
            let p = self.nodes[u].parent;
            if self.parent(p) != Self::EMPTY {
                if self.side(u) == self.side(p) {
                    // zig-zig
                    self.rotate(p);
                } else {
                    // zig-zag
                    self.rotate(u);
                }
            }
            self.rotate(u);
        }
    }
    /// Splays the first (LEFT) or last (RIGHT) node of the list containing u and returns it.
    fn extreme(&mut self, u: Idx, side: usize) -> Idx {
        self.splay(u);
        let mut cur = u;
        while self.nodes[cur].child[side] != Self::EMPTY {
            cur = self.nodes[cur].child[side];
        }
        self.splay(cur);
        cur
    }
    /// (First k, rest)
    fn split_k(&mut self, u: Idx, k: usize) -> (Idx, Idx) {
        if u == Self::EMPTY {
            return (Self::EMPTY, Self::EMPTY);
        }
        if k == 0 {
            self.splay(u);
            return (Self::EMPTY, u);
        }
        if k >= self.len(u) {
            return (u, Self::EMPTY);
        }
        let x = self.find_kth(u, k);
        let l = self.detach(x, LEFT);
        self.recalc(x);
        log::trace!("split_k({u}, {k}) = ({}, {x})", I(l));
        (l, x)
    }
}

impl<Ag: AggregatedData> Lists<Ag> for Splays<Ag> {
    const EMPTY: Idx = usize::MAX;

    fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    fn create(&mut self, data: Ag::Data) -> Idx {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Node::new(data);
            idx
        } else {
            self.nodes.push(Node::new(data));
            self.nodes.len() - 1
        }
    }

    fn free(&mut self, u: Idx) {
        let n = &self.nodes[u];
        assert!(
            n.parent == Self::EMPTY && n.child == [Self::EMPTY; 2],
            "Freeing {u} which is still part of a list: {n:?}"
        );
        self.free.push(u);
    }

    fn total_size(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn root(&self, mut u: Idx) -> Idx {
        while self.parent(u) != Self::EMPTY {
            u = self.nodes[u].parent;
        }
        u
    }

    fn access(&mut self, u: Idx) {
        if u != Self::EMPTY {
            self.splay(u);
        }
    }

    fn data(&self, u: Idx) -> &Ag::Data {
        &self.nodes[u].data
    }

    fn mutate_data(&mut self, u: Idx, f: impl FnOnce(&mut Ag::Data)) {
        self.splay(u);
        f(&mut self.nodes[u].data);
        self.recalc(u);
    }

    fn order(&mut self, u: Idx) -> usize {
        if u == Self::EMPTY {
            return 0;
        }
        self.splay(u);
        self.size(self.nodes[u].child[LEFT])
    }

    fn find_element(
        &mut self,
        u: Idx,
        mut search_strategy: impl FnMut(SearchData<'_, Ag>) -> SearchDirection,
    ) -> Idx {
        if u == Self::EMPTY {
            return Self::EMPTY;
        }
        self.splay(u);
        let mut cur = u;
        let mut last = u;
        use SearchDirection::*;
        let found = loop {
            if cur == Self::EMPTY {
                break Self::EMPTY;
            }
            last = cur;
            let [l, r] = self.child(cur);
            let direction = search_strategy(SearchData {
                current_data: &self.nodes[cur].data,
                left_agg: &self.ag_data(l),
                right_agg: &self.ag_data(r),
            });
            match direction {
                Found => break cur,
                NotFound => break Self::EMPTY,
                Left => cur = l,
                Right => cur = r,
            }
        };
        self.splay(last);
        found
    }

    fn find_kth(&mut self, u: Idx, mut k: usize) -> Idx {
        if u == Self::EMPTY {
            return Self::EMPTY;
        }
        self.splay(u);
        let mut cur = u;
        let mut last = u;
        let found = loop {
            if cur == Self::EMPTY {
                break Self::EMPTY;
            }
            last = cur;
            let [l, r] = self.nodes[cur].child;
            let sl = self.size(l);
            if sl > k {
                cur = l;
            } else if sl == k {
                break cur;
            } else {
                k -= sl + 1;
                cur = r;
            }
        };
        self.splay(last);
        found
    }

    fn len(&mut self, u: Idx) -> usize {
        if u == Self::EMPTY {
            return 0;
        }
        self.splay(u);
        self.nodes[u].size
    }

    fn total_agg(&mut self, u: Idx) -> Ag {
        if u == Self::EMPTY {
            return Ag::default();
        }
        self.splay(u);
        self.nodes[u].ag_data.clone()
    }

    fn for_each(&mut self, u: Idx, mut f: impl FnMut(Idx, &Ag::Data)) {
        if u == Self::EMPTY {
            return;
        }
        self.splay(u);
        let mut stack = vec![];
        let mut cur = u;
        while cur != Self::EMPTY || !stack.is_empty() {
            while cur != Self::EMPTY {
                stack.push(cur);
                cur = self.nodes[cur].child[LEFT];
            }
            if let Some(top) = stack.pop() {
                f(top, &self.nodes[top].data);
                cur = self.nodes[top].child[RIGHT];
            }
        }
    }

    fn concat(&mut self, u: Idx, v: Idx) -> Idx {
        if u == Self::EMPTY {
            self.access(v);
            return v;
        } else if v == Self::EMPTY {
            self.splay(u);
            return u;
        }
        if self.on_same_list(u, v) {
            // v was splayed last, so it is the root.
            return v;
        }
        let last = self.extreme(u, RIGHT);
        self.splay(v);
        self.attach(last, RIGHT, v);
        self.recalc(last);
        last
    }

    fn split_lr(&mut self, u: Idx, ql: usize, qr: usize) -> (Idx, Idx, Idx) {
        if u == Self::EMPTY {
            return (Self::EMPTY, Self::EMPTY, Self::EMPTY);
        }
        assert!(ql <= qr, "Invalid range {ql}..{qr}");
        let (l, mr) = self.split_k(u, ql);
        let (m, r) = self.split_k(mr, qr - ql);
        log::trace!("split({u}, {ql}..{qr}) = ({}, {}, {})", I(l), I(m), I(r));
        (l, m, r)
    }
}
