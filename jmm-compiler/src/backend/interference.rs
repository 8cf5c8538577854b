//! Interference graph over a method's locals and temporaries.

use super::cfg::ControlFlow;
use super::liveness::LivenessInfo;
use crate::ir::Method;
use std::collections::{BTreeMap, BTreeSet};

/// Undirected graph stored as an arena: vertices have stable indices and
/// symmetric adjacency sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterferenceGraph {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
    adj: Vec<BTreeSet<usize>>,
}

impl InterferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, adding it if needed.
    pub fn add_vertex(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        self.adj.push(BTreeSet::new());
        i
    }

    pub fn add_edge(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        let ia = self.add_vertex(a);
        let ib = self.add_vertex(b);
        self.adj[ia].insert(ib);
        self.adj[ib].insert(ia);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, v: usize) -> &str {
        &self.names[v]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.adj[v].iter().copied()
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adj[v].len()
    }

    pub fn interferes(&self, a: &str, b: &str) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(ia), Some(ib)) => self.adj[ia].contains(&ib),
            _ => false,
        }
    }

    /// Every edge once, as `(low, high)` vertex indices.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (a, ns) in self.adj.iter().enumerate() {
            for &b in ns {
                if a < b {
                    out.push((a, b));
                }
            }
        }
        out
    }
}

/// Build the graph for `method`.
///
/// Variables simultaneously in `out[i]` interfere, and a variable defined at
/// `i` interferes with everything else live after `i`, so a store whose
/// value is never read still gets a slot of its own.
pub fn build(method: &Method, cfg: &ControlFlow, live: &LivenessInfo) -> InterferenceGraph {
    let mut graph = InterferenceGraph::new();

    for v in method.locals.iter().filter(|v| v.is_allocatable()) {
        graph.add_vertex(&v.name);
    }
    for i in 0..cfg.len() {
        for name in cfg.uses[i].iter().chain(cfg.defs[i].iter()) {
            graph.add_vertex(name);
        }
    }

    for (i, out) in live.live_out.iter().enumerate() {
        let live: Vec<&String> = out.iter().collect();
        for (a, u) in live.iter().enumerate() {
            for v in &live[a + 1..] {
                graph.add_edge(u, v);
            }
        }
        for d in &cfg.defs[i] {
            for v in out {
                graph.add_edge(d, v);
            }
        }
    }

    graph
}
