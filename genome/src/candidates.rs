//! Candidate basis enumeration (§4.6): the neighbour-only phase and, when it
//! finds nothing, the two-vertex fallback phase, followed by symmetry-based
//! deduplication.
//!
//! Grounded on `symmetry.rs`'s neighbour-offset-basis idiom (matching
//! non-coplanar offset triples to build a 3×3 integer matrix) generalized
//! from "match two vertices' frames" to "classify a triple's offsets by the
//! coordination classes of the neighbours it reaches".
//!
//! The four-way order-type tag in the source material distinguishes, for a
//! triple of neighbour classes sorted ascending `(p, q, r)`: all equal (1);
//! the two smaller classes equal, "minor" relative to the third (2); the two
//! larger classes equal (3, read as the first two when the triple is listed
//! descending); all distinct (4). Within a tag, every ordering that leaves
//! the classification unchanged is a valid candidate: all `3!` orderings
//! when all three classes match, and the two orderings swapping the tied
//! pair when only two match.

use std::collections::HashSet;

use itertools::Itertools;

use crate::base::{int_det3, CrystalNet, GenomeError, IntMat3, IntVec3};
use crate::partition::Partition;
use crate::symmetry::Symmetries;

/// A candidate basis for `candidate_key`'s breadth-first relabelling: start
/// vertex `u` together with the oriented offset matrix `basis`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub u: usize,
    pub basis: IntMat3,
}

/// Enumerate candidate bases for `net`, given its `partition` and detected
/// `symmetries`.
///
/// Tries the neighbour-only phase first (every representative with at least
/// three neighbours, picking non-coplanar triples). Falls back to pairing
/// two neighbours at a representative with a third vertex's neighbour,
/// drawn from classes in partition order, stopping at the first class that
/// yields anything. Fails with [`GenomeError::NotThreeDimensional`] if the
/// net's offsets don't span three dimensions at all, or
/// [`GenomeError::InternalError`] if they do but neither phase found a
/// basis (a bug, not a malformed net).
pub fn find_candidates(
    net: &CrystalNet,
    partition: &Partition,
    symmetries: &Symmetries,
) -> Result<Vec<Candidate>, GenomeError> {
    let mut raw = neighbour_only_phase(net, partition);
    if raw.is_empty() {
        raw = fallback_phase(net, partition);
    }
    if raw.is_empty() {
        return Err(if spans_three_dimensions(net) {
            GenomeError::InternalError(
                "offsets span three dimensions but no candidate basis was found".to_string(),
            )
        } else {
            GenomeError::NotThreeDimensional
        });
    }
    Ok(deduplicate_via_symmetry(raw, symmetries))
}

fn spans_three_dimensions(net: &CrystalNet) -> bool {
    let offsets: Vec<IntVec3> = net.graph.half_edges().map(|(_, _, o)| o).collect();
    offsets.iter().combinations(3).any(|triple| {
        let m = IntMat3::from_columns(&[*triple[0], *triple[1], *triple[2]]);
        int_det3(&m) != 0
    })
}

/// `(order_type, sorted_classes)`: the lexicographically-comparable
/// classification of a neighbour triple.
type Tag = (u8, (usize, usize, usize));

fn order_type_tag(classes: [usize; 3]) -> Tag {
    let mut sorted = classes;
    sorted.sort_unstable();
    let (p, q, r) = (sorted[0], sorted[1], sorted[2]);
    let order_type = if p == q && q == r {
        1
    } else if p == q {
        2
    } else if q == r {
        3
    } else {
        4
    };
    (order_type, (p, q, r))
}

fn neighbour_only_phase(net: &CrystalNet, partition: &Partition) -> Vec<(usize, IntMat3)> {
    let mut best_tag: Option<Tag> = None;
    let mut winners: Vec<(usize, [usize; 3])> = Vec::new();

    for &u in &partition.representatives {
        let deg = net.graph.degree(u);
        if deg < 3 {
            continue;
        }
        let nbrs = net.graph.neighbours(u);
        for triple in (0..deg).combinations(3) {
            let offsets = [nbrs[triple[0]].1, nbrs[triple[1]].1, nbrs[triple[2]].1];
            let m = IntMat3::from_columns(&offsets);
            if int_det3(&m) == 0 {
                continue;
            }
            let classes = [
                partition.class_of[nbrs[triple[0]].0],
                partition.class_of[nbrs[triple[1]].0],
                partition.class_of[nbrs[triple[2]].0],
            ];
            let tag = order_type_tag(classes);
            let slots = [triple[0], triple[1], triple[2]];
            match &best_tag {
                Some(best) if tag > *best => continue,
                Some(best) if tag == *best => winners.push((u, slots)),
                _ => {
                    best_tag = Some(tag);
                    winners.clear();
                    winners.push((u, slots));
                }
            }
        }
    }

    let mut out = Vec::new();
    for (u, slots) in winners {
        let nbrs = net.graph.neighbours(u);
        let triple = [nbrs[slots[0]], nbrs[slots[1]], nbrs[slots[2]]];
        for ordering in tag_preserving_orderings(&triple, partition) {
            out.push((u, IntMat3::from_columns(&ordering.map(|(_, o)| o))));
        }
    }
    out
}

/// Every ordering of `triple`'s three half-edges that leaves the order-type
/// tag unchanged: all `3!` permutations when all three neighbour classes
/// coincide, the two orderings swapping the tied pair when exactly two
/// coincide, and just the one canonical class-ascending ordering otherwise.
fn tag_preserving_orderings(
    triple: &[(usize, IntVec3); 3],
    partition: &Partition,
) -> Vec<[(usize, IntVec3); 3]> {
    let classes: [usize; 3] = std::array::from_fn(|i| partition.class_of[triple[i].0]);
    let mut idx = [0usize, 1, 2];
    idx.sort_by_key(|&i| classes[i]);
    let canonical: [(usize, IntVec3); 3] = std::array::from_fn(|k| triple[idx[k]]);
    let canon_classes: [usize; 3] = std::array::from_fn(|k| classes[idx[k]]);

    if canon_classes[0] == canon_classes[1] && canon_classes[1] == canon_classes[2] {
        (0..3usize)
            .permutations(3)
            .map(|p| std::array::from_fn(|k| triple[p[k]]))
            .collect()
    } else if canon_classes[0] == canon_classes[1] {
        let mut swapped = canonical;
        swapped.swap(0, 1);
        vec![canonical, swapped]
    } else if canon_classes[1] == canon_classes[2] {
        let mut swapped = canonical;
        swapped.swap(1, 2);
        vec![canonical, swapped]
    } else {
        vec![canonical]
    }
}

fn is_parallel(a: &IntVec3, b: &IntVec3) -> bool {
    a.cross(b) == IntVec3::zeros()
}

fn fallback_phase(net: &CrystalNet, partition: &Partition) -> Vec<(usize, IntMat3)> {
    for class in &partition.classes {
        let mut best_tag: Option<(usize, usize, usize)> = None;
        let mut winners: Vec<(usize, IntVec3, IntVec3, IntVec3)> = Vec::new();

        for &u in &partition.representatives {
            let nbrs = net.graph.neighbours(u);
            for pair in (0..nbrs.len()).combinations(2) {
                let (w1, o1) = nbrs[pair[0]];
                let (w2, o2) = nbrs[pair[1]];
                if is_parallel(&o1, &o2) {
                    continue;
                }
                let c1 = partition.class_of[w1];
                let c2 = partition.class_of[w2];
                for &v in class {
                    for &(w3, o3) in net.graph.neighbours(v) {
                        let m = IntMat3::from_columns(&[o1, o2, o3]);
                        if int_det3(&m) == 0 {
                            continue;
                        }
                        let c3 = partition.class_of[w3];
                        let tag = (c1, c2, c3);
                        let mut candidates = vec![(u, o1, o2, o3)];
                        if c1 == c2 {
                            candidates.push((u, o2, o1, o3));
                        }
                        match &best_tag {
                            Some(best) if tag > *best => continue,
                            Some(best) if tag == *best => winners.extend(candidates),
                            _ => {
                                best_tag = Some(tag);
                                winners = candidates;
                            }
                        }
                    }
                }
            }
        }

        if !winners.is_empty() {
            return winners
                .into_iter()
                .map(|(u, a, b, c)| (u, IntMat3::from_columns(&[a, b, c])))
                .collect();
        }
    }
    Vec::new()
}

fn mat3_mul(a: &IntMat3, b: &IntMat3) -> IntMat3 {
    IntMat3::from_fn(|r, c| (0..3).map(|k| a[(r, k)] * b[(k, c)]).sum())
}

fn flatten(m: &IntMat3) -> [i32; 9] {
    std::array::from_fn(|i| m[(i % 3, i / 3)])
}

fn unflatten(flat: [i32; 9]) -> IntMat3 {
    IntMat3::from_fn(|r, c| flat[c * 3 + r])
}

/// Replace each raw candidate by the minimum of its orbit under the
/// stabilizer of `u`, then deduplicate.
fn deduplicate_via_symmetry(raw: Vec<(usize, IntMat3)>, symmetries: &Symmetries) -> Vec<Candidate> {
    let mut seen: HashSet<(usize, [i32; 9])> = HashSet::new();
    let mut out = Vec::new();
    for (u, m) in raw {
        let stab = symmetries.stabilizer(u);
        let mut min_flat = flatten(&m);
        for op in &stab {
            let rotated = mat3_mul(&op.rotation, &m);
            let flat = flatten(&rotated);
            if flat < min_flat {
                min_flat = flat;
            }
        }
        if seen.insert((u, min_flat)) {
            out.push(Candidate {
                u,
                basis: unflatten(min_flat),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Cell, Mat3Frac, PeriodicGraph3D, Vec3Frac};
    use crate::partition::partition_by_coordination_sequence;
    use crate::symmetry::find_symmetries;
    use crate::base::GenomeContext;

    fn cubic_cell() -> Cell {
        Cell::new(Mat3Frac::identity()).unwrap()
    }

    fn pcu_net() -> CrystalNet {
        let graph = PeriodicGraph3D::from_edges(
            1,
            &[
                (0, 0, IntVec3::new(1, 0, 0)),
                (0, 0, IntVec3::new(0, 1, 0)),
                (0, 0, IntVec3::new(0, 0, 1)),
            ],
        );
        CrystalNet::new(cubic_cell(), vec![0], vec![Vec3Frac::zero()], graph).unwrap()
    }

    #[test]
    fn test_pcu_neighbour_only_phase_is_nonempty() {
        let net = pcu_net();
        let ctx = GenomeContext::default();
        let symmetries = find_symmetries(&net).unwrap();
        let perms: Vec<_> = symmetries.operations.iter().map(|o| o.permutation.clone()).collect();
        let partition = partition_by_coordination_sequence(&net.graph, &perms, &ctx).unwrap();
        let candidates = find_candidates(&net, &partition, &symmetries).unwrap();
        assert!(!candidates.is_empty());
        for c in &candidates {
            assert_ne!(int_det3(&c.basis), 0);
        }
    }

    #[test]
    fn test_order_type_tag_classification() {
        assert_eq!(order_type_tag([1, 1, 1]).0, 1);
        assert_eq!(order_type_tag([0, 0, 2]).0, 2);
        assert_eq!(order_type_tag([0, 2, 2]).0, 3);
        assert_eq!(order_type_tag([0, 1, 2]).0, 4);
    }

    #[test]
    fn test_dia_candidates_cover_both_vertices_or_dedup_to_one() {
        let graph = PeriodicGraph3D::from_edges(
            2,
            &[
                (0, 1, IntVec3::new(0, 0, 0)),
                (0, 1, IntVec3::new(1, 0, 0)),
                (0, 1, IntVec3::new(0, 1, 0)),
                (0, 1, IntVec3::new(0, 0, 1)),
            ],
        );
        let net = CrystalNet::new(
            cubic_cell(),
            vec![0, 0],
            vec![
                Vec3Frac::zero(),
                Vec3Frac([
                    crate::base::frac(1, 4),
                    crate::base::frac(1, 4),
                    crate::base::frac(1, 4),
                ]),
            ],
            graph,
        )
        .unwrap();
        let ctx = GenomeContext::default();
        let symmetries = find_symmetries(&net).unwrap();
        let perms: Vec<_> = symmetries.operations.iter().map(|o| o.permutation.clone()).collect();
        let partition = partition_by_coordination_sequence(&net.graph, &perms, &ctx).unwrap();
        let candidates = find_candidates(&net, &partition, &symmetries).unwrap();
        assert!(!candidates.is_empty());
    }
}
