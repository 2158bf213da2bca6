use super::{Edge, Node};
use crate::error::GraphError;
use ahash::AHashMap;
use std::collections::VecDeque;

/// Kahn's algorithm over the store's nodes. Ties are broken by insertion
/// order; edges whose endpoints are not in `nodes` are ignored.
pub(super) fn topological_order<'a>(
    nodes: &'a [Node],
    edges: &[Edge],
) -> Result<Vec<&'a Node>, GraphError> {
    let position: AHashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; nodes.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for edge in edges {
        let (Some(&from), Some(&to)) = (
            position.get(edge.source.as_str()),
            position.get(edge.target.as_str()),
        ) else {
            continue;
        };
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(nodes.len());
    while let Some(current) = queue.pop_front() {
        sorted.push(&nodes[current]);
        for &next in &successors[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if sorted.len() != nodes.len() {
        return Err(GraphError::Cycle {
            unresolved: nodes.len() - sorted.len(),
        });
    }
    Ok(sorted)
}
