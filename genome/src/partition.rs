//! Vertex partition by coordination sequence (§4.5).
//!
//! Grounded on `base::permutation::orbits_from_permutations`'s union-find
//! over a list of permutations (itself grounded on moyo's
//! `base::cell::orbits_from_permutations`, backed by `union_find::QuickFindUf`),
//! generalized here to further merge orbits that happen to share an
//! identical coordination sequence.

use crate::base::{
    orbits_from_permutations, GenomeContext, GenomeError, Permutation, PeriodicGraph3D,
};

/// The graph's vertices grouped into classes sharing a coordination
/// sequence, sorted by `(|class| * seq[0], seq)` so the ordering depends
/// only on the graph's isomorphism class, never on input vertex numbering.
#[derive(Debug, Clone)]
pub struct Partition {
    pub classes: Vec<Vec<usize>>,
    /// `class_of[v]` is the index into `classes` containing vertex `v`.
    pub class_of: Vec<usize>,
    /// One representative vertex per class, same order as `classes`.
    pub representatives: Vec<usize>,
}

/// Partition `graph`'s vertices by coordination sequence, first collapsing
/// symmetry orbits (from `permutations`, e.g. `Symmetries::operations`'s
/// permutations) so equivalent vertices are never recomputed separately.
pub fn partition_by_coordination_sequence(
    graph: &PeriodicGraph3D,
    permutations: &[Permutation],
    ctx: &GenomeContext,
) -> Result<Partition, GenomeError> {
    let n = graph.num_vertices();
    for v in 0..n {
        if graph.degree(v) < 2 {
            return Err(GenomeError::InvalidInput(format!(
                "vertex {v} has degree < 2; degree-1 vertices must be pruned before partitioning"
            )));
        }
    }

    let orbits = orbits_from_permutations(n, permutations);
    let mut orbit_reps: Vec<usize> = (0..n).filter(|&v| orbits[v] == v).collect();
    orbit_reps.sort_unstable();

    let depth = ctx.coordination_sequence_depth;
    let mut groups: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();
    for &rep in &orbit_reps {
        let seq = graph.coordination_sequence(rep, depth);
        let members: Vec<usize> = (0..n).filter(|&v| orbits[v] == rep).collect();
        match groups.iter_mut().find(|(s, _)| *s == seq) {
            Some(group) => group.1.extend(members),
            None => groups.push((seq, members)),
        }
    }
    for (_, members) in groups.iter_mut() {
        members.sort_unstable();
    }
    groups.sort_by_key(|(seq, members)| {
        (members.len() * seq.first().copied().unwrap_or(0), seq.clone())
    });

    let mut class_of = vec![0usize; n];
    let mut classes = Vec::with_capacity(groups.len());
    let mut representatives = Vec::with_capacity(groups.len());
    for (class_idx, (_, members)) in groups.into_iter().enumerate() {
        for &v in &members {
            class_of[v] = class_idx;
        }
        representatives.push(members[0]);
        classes.push(members);
    }

    Ok(Partition {
        classes,
        class_of,
        representatives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::IntVec3;

    #[test]
    fn test_pcu_single_class() {
        let graph = PeriodicGraph3D::from_edges(
            1,
            &[
                (0, 0, IntVec3::new(1, 0, 0)),
                (0, 0, IntVec3::new(0, 1, 0)),
                (0, 0, IntVec3::new(0, 0, 1)),
            ],
        );
        let ctx = GenomeContext::default();
        let partition = partition_by_coordination_sequence(&graph, &[], &ctx).unwrap();
        assert_eq!(partition.classes, vec![vec![0]]);
    }

    #[test]
    fn test_dia_both_vertices_share_one_class() {
        let graph = PeriodicGraph3D::from_edges(
            2,
            &[
                (0, 1, IntVec3::new(0, 0, 0)),
                (0, 1, IntVec3::new(1, 0, 0)),
                (0, 1, IntVec3::new(0, 1, 0)),
                (0, 1, IntVec3::new(0, 0, 1)),
            ],
        );
        let ctx = GenomeContext::default();
        // Without symmetry permutations each vertex is its own orbit, but
        // both have identical coordination sequences and merge anyway.
        let partition = partition_by_coordination_sequence(&graph, &[], &ctx).unwrap();
        assert_eq!(partition.classes.len(), 1);
        assert_eq!(partition.classes[0].len(), 2);
    }

    #[test]
    fn test_symmetry_orbit_avoids_recomputation() {
        let graph = PeriodicGraph3D::from_edges(
            2,
            &[
                (0, 1, IntVec3::new(0, 0, 0)),
                (0, 1, IntVec3::new(1, 0, 0)),
                (0, 1, IntVec3::new(0, 1, 0)),
                (0, 1, IntVec3::new(0, 0, 1)),
            ],
        );
        let ctx = GenomeContext::default();
        let swap = Permutation::new(vec![1, 0]);
        let partition = partition_by_coordination_sequence(&graph, &[swap], &ctx).unwrap();
        assert_eq!(partition.classes.len(), 1);
        assert_eq!(partition.classes[0], vec![0, 1]);
        assert_eq!(partition.class_of, vec![0, 0]);
    }

    #[test]
    fn test_degree_one_vertex_is_rejected() {
        let graph = PeriodicGraph3D::from_edges(2, &[(0, 1, IntVec3::new(0, 0, 0))]);
        let ctx = GenomeContext::default();
        let err = partition_by_coordination_sequence(&graph, &[], &ctx).unwrap_err();
        assert!(matches!(err, GenomeError::InvalidInput(_)));
    }
}
