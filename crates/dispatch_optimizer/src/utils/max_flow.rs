use std::collections::VecDeque;

struct FlowEdge {
    to: usize,
    capacity: u64,
}

/// Residual graph for Edmonds-Karp. Edge `e` and its reverse live at
/// `e` and `e ^ 1`.
pub struct FlowGraph {
    edges: Vec<FlowEdge>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowGraph {
    pub fn new(nodes: usize) -> Self {
        FlowGraph {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); nodes],
        }
    }

    pub fn add_edge(&mut self, from: usize, to: usize, capacity: u64) {
        self.adjacency[from].push(self.edges.len());
        self.edges.push(FlowEdge { to, capacity });
        self.adjacency[to].push(self.edges.len());
        self.edges.push(FlowEdge {
            to: from,
            capacity: 0,
        });
    }

    /// Consumes the residual capacities.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> u64 {
        let mut total = 0;

        while let Some(path) = self.shortest_augmenting_path(source, sink) {
            let bottleneck = path
                .iter()
                .map(|&edge| self.edges[edge].capacity)
                .min()
                .unwrap_or(0);
            if bottleneck == 0 {
                break;
            }

            for edge in path {
                self.edges[edge].capacity -= bottleneck;
                self.edges[edge ^ 1].capacity += bottleneck;
            }
            total += bottleneck;
        }

        total
    }

    /// Edges of a shortest source → sink path with spare capacity.
    fn shortest_augmenting_path(&self, source: usize, sink: usize) -> Option<Vec<usize>> {
        let mut via = vec![None::<usize>; self.adjacency.len()];
        let mut visited = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::from([source]);
        visited[source] = true;

        while let Some(node) = queue.pop_front() {
            if node == sink {
                break;
            }
            for &edge in &self.adjacency[node] {
                let FlowEdge { to, capacity } = self.edges[edge];
                if capacity > 0 && !visited[to] {
                    visited[to] = true;
                    via[to] = Some(edge);
                    queue.push_back(to);
                }
            }
        }

        if !visited[sink] {
            return None;
        }

        let mut path = Vec::new();
        let mut node = sink;
        while let Some(edge) = via[node] {
            path.push(edge);
            node = self.edges[edge ^ 1].to;
        }
        Some(path)
    }
}
