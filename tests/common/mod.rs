use std::collections::BTreeSet;
use std::sync::{LazyLock, Mutex};

use dynamic_connectivity::{lists::AggregatedData, DynamicConnectivitySolver};
use flexi_logger::{Logger, LoggerHandle};

pub mod slow_lists;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggSum(pub i32);

impl AggregatedData for AggSum {
    type Data = i32;

    fn from(data: &Self::Data) -> Self {
        Self(*data)
    }

    fn merge(self, right: Self) -> Self {
        Self(self.0 + right.0)
    }
}

impl PartialEq<i32> for AggSum {
    fn eq(&self, other: &i32) -> bool {
        self.0 == *other
    }
}

#[allow(dead_code)]
pub static LOGGER: LazyLock<Mutex<LoggerHandle>> = LazyLock::new(|| {
    Mutex::new(
        Logger::try_with_env_or_str("info")
            .unwrap()
            .write_mode(flexi_logger::WriteMode::SupportCapture)
            .log_to_stdout()
            .set_palette("196;208;3;7;8".to_owned())
            .format(|w, now, record| {
                let style = flexi_logger::style(record.level());
                write!(
                    w,
                    "{} {pref}[{}] {}{suf}",
                    now.format("%H:%M:%S"),
                    &record.level().as_str()[0..1],
                    record.args(),
                    pref = style.prefix(),
                    suf = style.suffix(),
                )
            })
            .start()
            .unwrap(),
    )
});

#[allow(dead_code)]
pub fn init_logger() {
    let _ = &*LOGGER;
}

/// Brute force connectivity, recomputing components with a DFS on every query.
#[allow(dead_code)]
pub struct Dumb {
    adj: Vec<BTreeSet<usize>>,
}

impl std::fmt::Debug for Dumb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let v_to_id = self.groups();
        let mut gs = vec![vec![]; v_to_id.iter().copied().max().unwrap_or(0)];
        for (v, &id) in v_to_id.iter().enumerate() {
            gs[id - 1].push(v);
        }
        f.debug_struct("Dumb").field("groups", &gs).finish()
    }
}

#[allow(dead_code)]
impl Dumb {
    /// Component id of each vertex, starting from 1.
    pub fn groups(&self) -> Vec<usize> {
        let mut groups = vec![0; self.adj.len()];
        let mut group_id = 0;
        for u in 0..self.adj.len() {
            if groups[u] == 0 {
                group_id += 1;
                groups[u] = group_id;
                let mut stack = vec![u];
                while let Some(u) = stack.pop() {
                    groups[u] = group_id;
                    stack.extend(self.adj[u].iter().copied().filter(|&v| {
                        if groups[v] == 0 {
                            groups[v] = group_id;
                            true
                        } else {
                            false
                        }
                    }));
                }
            }
        }
        groups
    }

    pub fn component(&self, u: usize) -> BTreeSet<usize> {
        let gs = self.groups();
        (0..self.adj.len()).filter(|&v| gs[v] == gs[u]).collect()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj[u].contains(&v)
    }

    fn is_connected(&self, u: usize, v: usize) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![u];
        while let Some(u) = stack.pop() {
            if u == v {
                return true;
            }
            if seen.insert(u) {
                stack.extend(self.adj[u].iter().copied());
            }
        }
        false
    }
}

impl DynamicConnectivitySolver for Dumb {
    fn new(n: usize) -> Self {
        Self {
            adj: vec![BTreeSet::new(); n],
        }
    }

    fn link(&mut self, u: usize, v: usize) -> bool {
        if u == v || u >= self.adj.len() || v >= self.adj.len() {
            return false;
        }
        let was_connected = self.is_connected(u, v);
        self.adj[u].insert(v);
        self.adj[v].insert(u);
        !was_connected
    }

    fn cut(&mut self, u: usize, v: usize) -> bool {
        if u == v || u >= self.adj.len() || v >= self.adj.len() {
            return false;
        }
        if !(self.adj[u].remove(&v) && self.adj[v].remove(&u)) {
            return false;
        }
        !self.is_connected(u, v)
    }

    fn same_component(&mut self, u: usize, v: usize) -> bool {
        u < self.adj.len() && v < self.adj.len() && self.is_connected(u, v)
    }

    fn component_size(&mut self, v: usize) -> usize {
        if v >= self.adj.len() {
            return 0;
        }
        self.component(v).len()
    }
}
