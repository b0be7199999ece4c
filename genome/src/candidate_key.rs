//! Breadth-oriented relabelling (§4.7): walk the graph from a candidate
//! start vertex in the candidate basis, emitting a canonically-ordered
//! vertex map and edge list, aborting as soon as it proves no better than
//! a running minimum.
//!
//! Grounded stylistically on `graph::PeriodicGraph3D::bfs_from`'s
//! queue-over-the-universal-cover shape, generalized to also grow a vertex
//! relabelling and a new-basis edge list while comparing against
//! `best_so_far`.

use std::cmp::Ordering;

use crate::base::{int_inverse_unimodular, rotate_vec3, CrystalNet, IntMat3, IntVec3, Vec3Frac};

/// A single rewritten edge `(s, d, o)` in the new vertex numbering and
/// candidate basis.
pub type KeyEdge = (usize, usize, IntVec3);

/// Relabel `net` breadth-first from `(u, b)`, returning the vertex map and
/// resulting edge list if it is strictly lexicographically smaller than
/// `best_so_far`, or `None` if it ties or loses (or if `b` is not
/// unimodular, or the walk produces a non-integer offset, which would
/// indicate `b`'s columns were not drawn from the graph's own offsets).
///
/// `best_so_far = None` always counts as an improvement, matching
/// "initialise best to a sentinel worse than any real edge" without having
/// to fabricate one.
pub fn candidate_key(
    net: &CrystalNet,
    u: usize,
    b: &IntMat3,
    best_so_far: Option<&[KeyEdge]>,
) -> Option<(Vec<usize>, Vec<KeyEdge>)> {
    let n = net.num_vertices();
    let i_b = int_inverse_unimodular(b)?;

    let mut vmap = vec![u];
    let mut rev_vmap = vec![usize::MAX; n];
    rev_vmap[u] = 0;
    let mut newpos = vec![Vec3Frac::zero()];
    let mut offsets = vec![IntVec3::zeros()];
    let mut edges: Vec<KeyEdge> = Vec::new();
    let mut flag_improved = false;

    let origin = net.pos[u].clone();

    let mut t = 0;
    while t < vmap.len() {
        let current = vmap[t];
        let ofst = Vec3Frac::from_ints(&offsets[t]);

        let mut labelled: Vec<(Vec3Frac, usize)> = net
            .graph
            .neighbours(current)
            .iter()
            .map(|&(w, o)| {
                let sum = &net.pos[w] + &Vec3Frac::from_ints(&o);
                let diff = &sum - &origin;
                let shifted = &diff + &ofst;
                (rotate_vec3(&i_b, &shifted), w)
            })
            .collect();

        // Visit order: group all occurrences of the same old vertex `w`
        // together, ordered by `w`'s first appearance in the `c`-sorted
        // list, then by `c` within each group.
        let mut by_c = labelled.clone();
        by_c.sort_by(|a, b| cmp_vec3frac(&a.0, &b.0));
        let mut first_occurrence: Vec<Option<usize>> = vec![None; n];
        for (pos, &(_, w)) in by_c.iter().enumerate() {
            first_occurrence[w].get_or_insert(pos);
        }
        labelled.sort_by(|a, b| {
            first_occurrence[a.1]
                .unwrap()
                .cmp(&first_occurrence[b.1].unwrap())
                .then_with(|| cmp_vec3frac(&a.0, &b.0))
        });

        for (c, w) in labelled {
            let edge = if rev_vmap[w] == usize::MAX {
                let h = vmap.len();
                rev_vmap[w] = h;
                vmap.push(w);

                let rotated = rotate_vec3(b, &c);
                let sum = &rotated + &origin;
                let off_frac = &sum - &net.pos[w];
                let off_ints = off_frac.try_to_ints()?;
                newpos.push(c.clone());
                offsets.push(off_ints);
                (t, h, IntVec3::zeros())
            } else {
                let target = rev_vmap[w];
                let diff = &c - &newpos[target];
                let off_ints = diff.try_to_ints()?;
                (t, target, off_ints)
            };

            edges.push(edge);
            if !flag_improved {
                let idx = edges.len() - 1;
                match best_so_far {
                    None => flag_improved = true,
                    Some(best) => match cmp_edge(&edges[idx], &best[idx]) {
                        Ordering::Greater => return None,
                        Ordering::Less => flag_improved = true,
                        Ordering::Equal => {}
                    },
                }
            }
        }

        t += 1;
    }

    flag_improved.then_some((vmap, edges))
}

fn cmp_vec3frac(a: &Vec3Frac, b: &Vec3Frac) -> Ordering {
    for i in 0..3 {
        match a.0[i].cmp(&b.0[i]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn cmp_edge(a: &KeyEdge, b: &KeyEdge) -> Ordering {
    a.0.cmp(&b.0)
        .then_with(|| a.1.cmp(&b.1))
        .then_with(|| a.2.x.cmp(&b.2.x))
        .then_with(|| a.2.y.cmp(&b.2.y))
        .then_with(|| a.2.z.cmp(&b.2.z))
}
