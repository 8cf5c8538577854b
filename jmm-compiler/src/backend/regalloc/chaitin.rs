//! Chaitin-style simplify/select coloring. No spilling: if the graph is not
//! k-colorable by simplification, allocation fails.

use super::{RegAllocError, RegAllocator, RegisterMap};
use crate::backend::interference::{self, InterferenceGraph};
use crate::backend::{cfg, liveness};
use crate::ir::Method;
use crate::CompileError;

pub struct GraphColoringAllocator {
    k: u16,
}

impl GraphColoringAllocator {
    pub fn new(k: u16) -> Self {
        Self { k }
    }
}

impl RegAllocator for GraphColoringAllocator {
    fn allocate(&self, method: &Method) -> Result<RegisterMap, CompileError> {
        let flow = cfg::build(method)?;
        let live = liveness::compute_liveness(&flow);
        log::debug!(
            "{}: liveness converged after {} passes",
            method.name,
            live.iterations
        );

        let graph = interference::build(method, &flow, &live);
        let colors = color(&graph, self.k).map_err(|source| CompileError::Allocation {
            method: method.name.clone(),
            source,
        })?;

        Ok((0..graph.len())
            .map(|v| (graph.name(v).to_string(), colors[v]))
            .collect())
    }
}

/// Color `graph` with at most `k` colors, returning one color per vertex.
pub fn color(graph: &InterferenceGraph, k: u16) -> Result<Vec<u16>, RegAllocError> {
    let n = graph.len();
    let limit = k as usize;

    // Simplify on a soft-deleted view; the graph itself is left intact for
    // select.
    let mut active = vec![true; n];
    let mut degree: Vec<usize> = (0..n).map(|v| graph.degree(v)).collect();
    let mut stack = Vec::with_capacity(n);

    for remaining in (1..=n).rev() {
        let v = (0..n)
            .find(|&v| active[v] && degree[v] < limit)
            .ok_or(RegAllocError::NoLowDegreeVertex { remaining, k })?;
        active[v] = false;
        for u in graph.neighbors(v) {
            if active[u] {
                degree[u] -= 1;
            }
        }
        stack.push(v);
    }

    let mut colors: Vec<Option<u16>> = vec![None; n];
    while let Some(v) = stack.pop() {
        let taken: Vec<u16> = graph.neighbors(v).filter_map(|u| colors[u]).collect();
        let c = (0..k)
            .find(|c| !taken.contains(c))
            .ok_or_else(|| RegAllocError::NoFreeColor {
                variable: graph.name(v).to_string(),
                k,
            })?;
        colors[v] = Some(c);
    }

    Ok(colors.into_iter().map(|c| c.unwrap_or_default()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> InterferenceGraph {
        let mut g = InterferenceGraph::new();
        g.add_edge("a", "b");
        g.add_edge("b", "c");
        g.add_edge("a", "c");
        g
    }

    #[test]
    fn triangle_needs_three_colors() {
        let g = triangle();
        assert_eq!(
            color(&g, 2),
            Err(RegAllocError::NoLowDegreeVertex { remaining: 3, k: 2 })
        );
        let colors = color(&g, 3).unwrap();
        for (a, b) in g.edges() {
            assert_ne!(colors[a], colors[b]);
        }
    }

    #[test]
    fn isolated_vertices_share_color_zero() {
        let mut g = InterferenceGraph::new();
        g.add_vertex("x");
        g.add_vertex("y");
        assert_eq!(color(&g, 1).unwrap(), vec![0, 0]);
    }

    #[test]
    fn path_is_two_colorable() {
        let mut g = InterferenceGraph::new();
        g.add_edge("a", "b");
        g.add_edge("b", "c");
        g.add_edge("c", "d");
        let colors = color(&g, 2).unwrap();
        for (a, b) in g.edges() {
            assert_ne!(colors[a], colors[b], "{} and {} share a color", g.name(a), g.name(b));
        }
    }
}
