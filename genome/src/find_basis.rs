//! Reduce the winning candidate's edge offsets to a short integer basis
//! (§4.8), direct reuse of [`crate::math::HNF`] as moyo's
//! `primitive_cell_from_transformation` reuses it to recover a lattice
//! basis from a Hermite-normal-form matrix.

use nalgebra::{Dyn, OMatrix, U3};

use crate::base::{int_det3, int_inverse_unimodular, GenomeError, IntMat3, IntVec3};
use crate::candidate_key::KeyEdge;

/// Collect the winning edge list's distinct non-zero offsets, fold each to
/// a canonical sign, reduce them (plus the three unit axes, a spanning
/// fallback) to Hermite normal form, and rewrite every edge in the
/// resulting short basis.
pub fn find_basis(edges: &[KeyEdge]) -> Result<(IntMat3, Vec<KeyEdge>), GenomeError> {
    let mut distinct: Vec<IntVec3> = Vec::new();
    for &(_, _, o) in edges {
        if o == IntVec3::zeros() {
            continue;
        }
        let canon = canonical_sign(o);
        if !distinct.contains(&canon) {
            distinct.push(canon);
        }
    }

    let mut columns = distinct;
    columns.push(IntVec3::new(1, 0, 0));
    columns.push(IntVec3::new(0, 1, 0));
    columns.push(IntVec3::new(0, 0, 1));

    let generators = OMatrix::<i32, U3, Dyn>::from_columns(&columns);
    let hnf = crate::math::HNF::new(&generators);
    let mut basis =
        IntMat3::from_columns(&[hnf.h.column(0), hnf.h.column(1), hnf.h.column(2)]);

    let det = int_det3(&basis);
    if det == 0 {
        return Err(GenomeError::InternalError(
            "candidate edge offsets do not span a rank-3 lattice".to_string(),
        ));
    }
    if det < 0 {
        for row in 0..3 {
            basis[(row, 0)] = -basis[(row, 0)];
        }
    }
    if int_det3(&basis) != 1 {
        return Err(GenomeError::InternalError(
            "final basis determinant is not unimodular".to_string(),
        ));
    }

    let inv = int_inverse_unimodular(&basis).ok_or_else(|| {
        GenomeError::InternalError("final basis is not invertible over the integers".to_string())
    })?;

    let rewritten = edges
        .iter()
        .map(|&(s, d, o)| (s, d, rotate_int(&inv, &o)))
        .collect();

    Ok((basis, rewritten))
}

fn rotate_int(r: &IntMat3, v: &IntVec3) -> IntVec3 {
    r * v
}

/// Negate `o` if its leading non-zero component is negative, so every
/// distinct offset direction is represented exactly once regardless of
/// which of its two signed forms the graph happened to store.
fn canonical_sign(o: IntVec3) -> IntVec3 {
    let leading = [o.x, o.y, o.z].into_iter().find(|&c| c != 0).unwrap_or(0);
    if leading < 0 {
        -o
    } else {
        o
    }
}
