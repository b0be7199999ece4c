//! Directed half-edge representation of a 3-periodic labelled graph.

use std::collections::HashSet;

use super::arithmetic::IntVec3;

/// A half-edge `(dst, ofs)`: "there is an edge to `dst` in the cell shifted
/// by `ofs` from the cell of the vertex this half-edge is stored under".
pub type HalfEdge = (usize, IntVec3);

/// Lexicographic order on half-edges, keyed on `(dst, ofs.x, ofs.y, ofs.z)`.
/// `IntVec3` is a `nalgebra::Vector3<i32>` and doesn't implement `Ord`, so
/// `Vec<HalfEdge>` can't derive a sort order for `binary_search`; this
/// reconstructs the same total order component-wise.
fn cmp_half_edge(a: &HalfEdge, b: &HalfEdge) -> std::cmp::Ordering {
    a.0.cmp(&b.0)
        .then_with(|| a.1.x.cmp(&b.1.x))
        .then_with(|| a.1.y.cmp(&b.1.y))
        .then_with(|| a.1.z.cmp(&b.1.z))
}

/// A directed periodic graph on `n` vertices numbered `0..n`, closed under
/// the involution `(s, d, o) <-> (d, s, -o)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicGraph3D {
    adjacency: Vec<Vec<HalfEdge>>,
}

impl PeriodicGraph3D {
    pub fn new(num_vertices: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); num_vertices],
        }
    }

    /// Build a graph from a list of directed edges, inserting the reverse
    /// half-edge for each one automatically. Duplicate `(s, d, o)` triples
    /// are collapsed.
    pub fn from_edges(num_vertices: usize, edges: &[(usize, usize, IntVec3)]) -> Self {
        let mut graph = Self::new(num_vertices);
        for &(s, d, ofs) in edges {
            graph.add_edge(s, d, ofs);
        }
        graph
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    pub fn neighbours(&self, v: usize) -> &[HalfEdge] {
        &self.adjacency[v]
    }

    pub fn has_edge(&self, s: usize, d: usize, ofs: IntVec3) -> bool {
        self.adjacency[s]
            .binary_search_by(|probe| cmp_half_edge(probe, &(d, ofs)))
            .is_ok()
    }

    /// Insert `(s, d, ofs)` and its involute `(d, s, -ofs)`. A self-loop with
    /// a zero offset is rejected (it violates the periodic-graph invariant).
    pub fn add_edge(&mut self, s: usize, d: usize, ofs: IntVec3) {
        if s == d && ofs == IntVec3::zeros() {
            panic!("self-loop with zero offset is not a valid periodic-graph edge");
        }
        insert_sorted(&mut self.adjacency[s], (d, ofs));
        insert_sorted(&mut self.adjacency[d], (s, -ofs));
    }

    pub fn remove_edge(&mut self, s: usize, d: usize, ofs: IntVec3) {
        if let Ok(i) = self.adjacency[s].binary_search_by(|probe| cmp_half_edge(probe, &(d, ofs))) {
            self.adjacency[s].remove(i);
        }
        if let Ok(i) = self.adjacency[d].binary_search_by(|probe| cmp_half_edge(probe, &(s, -ofs))) {
            self.adjacency[d].remove(i);
        }
    }

    /// All directed half-edges, vertex by vertex.
    pub fn half_edges(&self) -> impl Iterator<Item = (usize, usize, IntVec3)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(s, nbrs)| {
            nbrs.iter().map(move |&(d, ofs)| (s, d, ofs))
        })
    }

    /// Breadth-first traversal of the universal cover starting at `(v, 0)`,
    /// grouped shell by shell: `shells[0] = [(v, 0)]`, and `shells[i]` is
    /// every `(vertex, offset)` pair first reached at graph distance exactly
    /// `i`. Stops after `max_depth` shells past the root, since the
    /// universal cover of a genuinely periodic graph is infinite and an
    /// unbounded walk would never terminate.
    pub fn bfs_from(&self, v: usize, max_depth: usize) -> Vec<Vec<(usize, IntVec3)>> {
        let mut visited: HashSet<(usize, IntVec3)> = HashSet::new();
        visited.insert((v, IntVec3::zeros()));
        let mut shells = vec![vec![(v, IntVec3::zeros())]];

        for _ in 0..max_depth {
            let mut next = Vec::new();
            for &(u, base_ofs) in shells.last().unwrap() {
                for &(w, ofs) in self.neighbours(u) {
                    let shifted = (w, base_ofs + ofs);
                    if visited.insert(shifted) {
                        next.push(shifted);
                    }
                }
            }
            shells.push(next);
        }
        shells
    }

    /// Sizes of the 1..=k coordination shells of `v` in the universal cover,
    /// i.e. `shell[i]` is the number of distinct `(vertex, offset)` pairs at
    /// graph distance exactly `i + 1` from `(v, 0)`.
    pub fn coordination_sequence(&self, v: usize, k: usize) -> Vec<usize> {
        self.bfs_from(v, k)
            .into_iter()
            .skip(1)
            .map(|shell| shell.len())
            .collect()
    }
}

fn insert_sorted(v: &mut Vec<HalfEdge>, item: HalfEdge) {
    match v.binary_search_by(|probe| cmp_half_edge(probe, &item)) {
        Ok(_) => {}
        Err(pos) => v.insert(pos, item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcu() -> PeriodicGraph3D {
        PeriodicGraph3D::from_edges(
            1,
            &[
                (0, 0, IntVec3::new(1, 0, 0)),
                (0, 0, IntVec3::new(0, 1, 0)),
                (0, 0, IntVec3::new(0, 0, 1)),
            ],
        )
    }

    #[test]
    fn test_involution_closure() {
        let g = pcu();
        assert_eq!(g.degree(0), 6);
        assert!(g.has_edge(0, 0, IntVec3::new(1, 0, 0)));
        assert!(g.has_edge(0, 0, IntVec3::new(-1, 0, 0)));
    }

    #[test]
    fn test_coordination_sequence_pcu() {
        let g = pcu();
        // pcu coordination sequence: 6, 18, 38, 66, ...
        let seq = g.coordination_sequence(0, 4);
        assert_eq!(seq, vec![6, 18, 38, 66]);
    }

    #[test]
    fn test_coordination_sequence_dia() {
        let g = PeriodicGraph3D::from_edges(
            2,
            &[
                (0, 1, IntVec3::new(0, 0, 0)),
                (0, 1, IntVec3::new(1, 0, 0)),
                (0, 1, IntVec3::new(0, 1, 0)),
                (0, 1, IntVec3::new(0, 0, 1)),
            ],
        );
        assert_eq!(g.degree(0), 4);
        assert_eq!(g.degree(1), 4);
        // diamond coordination sequence: 4, 12, 24, 42, ...
        let seq = g.coordination_sequence(0, 4);
        assert_eq!(seq, vec![4, 12, 24, 42]);
    }

    #[test]
    fn test_remove_edge() {
        let mut g = pcu();
        g.remove_edge(0, 0, IntVec3::new(1, 0, 0));
        assert_eq!(g.degree(0), 4);
        assert!(!g.has_edge(0, 0, IntVec3::new(1, 0, 0)));
        assert!(!g.has_edge(0, 0, IntVec3::new(-1, 0, 0)));
    }
}
