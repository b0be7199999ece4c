//! Point symmetries of the embedded periodic graph (§4.3): integer
//! transforms `R` and vertex permutations `π` that leave the edge set
//! unchanged and are consistent with the equilibrium positions mod 1.
//!
//! Grounded on the candidate-generate-then-verify shape of
//! `search::primitive_symmetry_search::search_bravais_group`: candidate
//! rotations are read off by matching neighbour-offset bases at two
//! same-degree vertices, then each candidate is extended to a full vertex
//! permutation by the BFS group-closure idiom of `base::operation::traverse`.

use std::collections::HashSet;

use itertools::Itertools;

use crate::base::{
    int_det3, rotate_vec3, CrystalNet, GenomeError, IntMat3, IntVec3, Permutation, Vec3Frac,
};

/// A point symmetry: an integer rotation paired with the vertex
/// permutation it induces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetryOperation {
    pub rotation: IntMat3,
    pub permutation: Permutation,
}

#[derive(Debug, Clone)]
pub struct Symmetries {
    pub operations: Vec<SymmetryOperation>,
    pub has_orientation_reversing: bool,
}

impl Symmetries {
    /// Operations whose permutation fixes `u`, i.e. the point group at `u`.
    pub fn stabilizer(&self, u: usize) -> Vec<&SymmetryOperation> {
        self.operations
            .iter()
            .filter(|op| op.permutation.apply(u) == u)
            .collect()
    }
}

/// Detect all point symmetries of `net`'s periodic graph consistent with
/// its equilibrium embedding.
pub fn find_symmetries(net: &CrystalNet) -> Result<Symmetries, GenomeError> {
    let n = net.num_vertices();
    let graph = &net.graph;

    let mut seen: HashSet<(Vec<i32>, Vec<usize>)> = HashSet::new();
    let mut operations = Vec::new();

    for u in 0..n {
        if graph.degree(u) != graph.degree(0) {
            continue;
        }
        for rotation in candidate_rotations(net, 0, u) {
            if let Some(permutation) = extend_permutation(net, &rotation, 0, u) {
                let key = (rotation.as_slice().to_vec(), permutation_vec(&permutation, n));
                if seen.insert(key) {
                    operations.push(SymmetryOperation {
                        rotation,
                        permutation,
                    });
                }
            }
        }
    }

    let has_orientation_reversing = operations.iter().any(|op| int_det3(&op.rotation) < 0);
    Ok(Symmetries {
        operations,
        has_orientation_reversing,
    })
}

fn permutation_vec(p: &Permutation, n: usize) -> Vec<usize> {
    (0..n).map(|i| p.apply(i)).collect()
}

/// Candidate rotations taking `src`'s local neighbour-offset frame onto
/// `dst`'s, read off from every ordered non-coplanar triple of neighbours
/// at each vertex.
fn candidate_rotations(net: &CrystalNet, src: usize, dst: usize) -> Vec<IntMat3> {
    let mut out = Vec::new();
    let src_offsets: Vec<IntVec3> = net.graph.neighbours(src).iter().map(|&(_, o)| o).collect();
    let dst_offsets: Vec<IntVec3> = net.graph.neighbours(dst).iter().map(|&(_, o)| o).collect();
    if src_offsets.len() < 3 {
        return out;
    }

    for src_triple in (0..src_offsets.len()).permutations(3) {
        let b_src = frac_matrix_from_offsets(
            &src_offsets[src_triple[0]],
            &src_offsets[src_triple[1]],
            &src_offsets[src_triple[2]],
        );
        let Some(b_src_inv) = b_src.try_inverse() else {
            continue;
        };
        for dst_triple in (0..dst_offsets.len()).permutations(3) {
            let b_dst = frac_matrix_from_offsets(
                &dst_offsets[dst_triple[0]],
                &dst_offsets[dst_triple[1]],
                &dst_offsets[dst_triple[2]],
            );
            let rotation = b_dst.mul_mat(&b_src_inv);
            let Some(r) = rotation.try_to_int_matrix() else {
                continue;
            };
            let d = int_det3(&r);
            if d == 1 || d == -1 {
                out.push(r);
            }
        }
    }
    out
}

fn frac_matrix_from_offsets(
    a: &IntVec3,
    b: &IntVec3,
    c: &IntVec3,
) -> crate::base::Mat3Frac {
    crate::base::Mat3Frac::from_columns(
        Vec3Frac::from_ints(a),
        Vec3Frac::from_ints(b),
        Vec3Frac::from_ints(c),
    )
}

fn rotate_ivec3(r: &IntMat3, v: &IntVec3) -> IntVec3 {
    r * v
}

/// Try to extend `(0 -> root_image)` with rotation `r` into a full vertex
/// permutation by breadth-first propagation across edges, rejecting at the
/// first inconsistency. Never backtracks: a `None` result means no
/// permutation consistent with this seed and rotation exists along the
/// path explored, which suffices whenever offsets-to-neighbour mappings
/// are unambiguous (the expected case for a stable net).
fn extend_permutation(
    net: &CrystalNet,
    rotation: &IntMat3,
    root: usize,
    root_image: usize,
) -> Option<Permutation> {
    let n = net.num_vertices();
    let mut assigned: Vec<Option<usize>> = vec![None; n];
    let mut used = vec![false; n];
    assigned[root] = Some(root_image);
    used[root_image] = true;

    if rotate_vec3(rotation, &net.pos[root]).fract_mod1() != net.pos[root_image].fract_mod1() {
        return None;
    }

    let mut queue = std::collections::VecDeque::new();
    queue.push_back(root);
    while let Some(s) = queue.pop_front() {
        let t = assigned[s].unwrap();
        for &(w, ofs) in net.graph.neighbours(s) {
            let target_ofs = rotate_ivec3(rotation, &ofs);
            let candidates: Vec<usize> = net
                .graph
                .neighbours(t)
                .iter()
                .filter(|&&(_, o)| o == target_ofs)
                .map(|&(d, _)| d)
                .collect();

            let want_pos = rotate_vec3(rotation, &net.pos[w]).fract_mod1();
            let d = candidates
                .into_iter()
                .find(|&d| net.pos[d].fract_mod1() == want_pos)?;

            match assigned[w] {
                Some(existing) if existing != d => return None,
                Some(_) => continue,
                None => {
                    if used[d] {
                        return None;
                    }
                    assigned[w] = Some(d);
                    used[d] = true;
                    queue.push_back(w);
                }
            }
        }
    }

    let mapping: Option<Vec<usize>> = assigned.into_iter().collect();
    let mapping = mapping?;

    // Final sanity check: every edge must map to an edge under (rotation, mapping).
    for (s, d, ofs) in net.graph.half_edges() {
        let expected = (mapping[d], rotate_ivec3(rotation, &ofs));
        if !net
            .graph
            .has_edge(mapping[s], expected.0, expected.1)
        {
            return None;
        }
    }

    Some(Permutation::new(mapping))
}
