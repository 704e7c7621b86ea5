//! Small directed graph with strongly connected components and a stable
//! topological order.

use std::collections::BTreeSet;

/// Directed graph over vertices `0..n`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Digraph {
    edges: Vec<BTreeSet<usize>>,
}

impl Digraph {
    pub fn new(vertices: usize) -> Self {
        Self {
            edges: vec![BTreeSet::new(); vertices],
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Add `from -> to`; self loops are ignored.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        if from != to {
            self.edges[from].insert(to);
        }
    }

    pub fn successors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges[vertex].iter().copied()
    }

    /// Strongly connected components (Tarjan). Vertices of each component
    /// are sorted ascending.
    pub fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        let mut state = Tarjan {
            graph: self,
            index: 0,
            indices: vec![None; self.len()],
            lowlink: vec![0; self.len()],
            on_stack: vec![false; self.len()],
            stack: Vec::new(),
            components: Vec::new(),
        };
        for v in 0..self.len() {
            if state.indices[v].is_none() {
                state.connect(v);
            }
        }
        state.components
    }

    /// Topological order of the graph with every component contracted to
    /// one vertex. Returns, per vertex, the position of its component.
    /// Ready components are taken smallest vertex first, so the order is
    /// deterministic and follows vertex order where edges allow.
    pub fn component_order(&self) -> Vec<usize> {
        let components = self.strongly_connected_components();
        let mut component_of = vec![0; self.len()];
        for (c, vertices) in components.iter().enumerate() {
            for &v in vertices {
                component_of[v] = c;
            }
        }

        let mut contracted = Digraph::new(components.len());
        for v in 0..self.len() {
            for w in self.successors(v) {
                contracted.add_edge(component_of[v], component_of[w]);
            }
        }
        let mut in_degree = vec![0usize; components.len()];
        for c in 0..contracted.len() {
            for d in contracted.successors(c) {
                in_degree[d] += 1;
            }
        }

        // keyed by smallest member vertex
        let mut ready: BTreeSet<(usize, usize)> = (0..components.len())
            .filter(|&c| in_degree[c] == 0)
            .map(|c| (components[c][0], c))
            .collect();
        let mut position = vec![0; components.len()];
        let mut next = 0;
        while let Some((_, c)) = ready.pop_first() {
            position[c] = next;
            next += 1;
            for d in contracted.successors(c) {
                in_degree[d] -= 1;
                if in_degree[d] == 0 {
                    ready.insert((components[d][0], d));
                }
            }
        }

        component_of.iter().map(|&c| position[c]).collect()
    }
}

struct Tarjan<'g> {
    graph: &'g Digraph,
    index: usize,
    indices: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    components: Vec<Vec<usize>>,
}

impl Tarjan<'_> {
    fn connect(&mut self, v: usize) {
        self.indices[v] = Some(self.index);
        self.lowlink[v] = self.index;
        self.index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let graph = self.graph;
        for w in graph.successors(v) {
            match self.indices[w] {
                None => {
                    self.connect(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(index) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.indices[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            component.sort_unstable();
            self.components.push(component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let mut g = Digraph::new(4);
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        g.add_edge(1, 2);
        let mut components = g.strongly_connected_components();
        components.sort();
        assert_eq!(components, vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn test_order_respects_edges() {
        // 2 -> 0, 1 independent
        let mut g = Digraph::new(3);
        g.add_edge(2, 0);
        let order = g.component_order();
        assert!(order[2] < order[0]);
        assert_eq!(order[1], 0);
    }

    #[test]
    fn test_cycle_shares_position() {
        let mut g = Digraph::new(3);
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        g.add_edge(2, 0);
        let order = g.component_order();
        assert_eq!(order[0], order[1]);
        assert!(order[2] < order[0]);
    }
}
