//! Translation search and primitive-cell reduction (§4.4).
//!
//! Grounded on `search::primitive_cell::PrimitiveCell::new`: gather every
//! vertex-pair difference that acts as a graph automorphism, recover a
//! minimal enlarging matrix from them via `math::HNF`
//! (`transformation_matrix_from_translations`), then quotient the graph by
//! that matrix. Unlike the float/symprec-driven original this crate's
//! positions are exact, so the "size" scale factor fed to `HNF` is the exact
//! LCM of denominators rather than a guessed atom count.

use std::cmp::Reverse;

use nalgebra::{Dyn, OMatrix, U3};
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive, Zero};

use crate::base::{
    rotate_vec3, Cell, CrystalNet, Frac, GenomeContext, GenomeError, IntMat3, IntVec3, Mat3Frac,
    Permutation, Vec3Frac,
};

/// Candidate non-trivial translations `pos[k] - pos[0]`, sorted with the
/// most axis-aligned (most zero coordinates) and simplest (smallest
/// denominator) candidates first, since those are the cheapest to verify
/// and the likeliest to be genuine lattice translations.
pub fn possible_translations(net: &CrystalNet) -> Vec<Vec3Frac> {
    let n = net.num_vertices();
    let mut translations: Vec<Vec3Frac> = Vec::new();
    for k in 1..n {
        let t = &net.pos[k] - &net.pos[0];
        if !t.is_zero() && !translations.contains(&t) {
            translations.push(t);
        }
    }
    translations.sort_by_key(sort_key);
    translations
}

fn rotate_ofs(r: &IntMat3, v: &IntVec3) -> IntVec3 {
    r * v
}

fn sort_key(t: &Vec3Frac) -> (Reverse<usize>, usize, BigInt) {
    let zero_count = t.0.iter().filter(|c| c.is_zero()).count();
    let leading = t.0.iter().position(|c| !c.is_zero()).unwrap_or(3);
    let denom = t.0.iter().map(|c| c.denom().clone()).max().unwrap();
    (Reverse(zero_count), leading, denom)
}

/// `true` iff translating every vertex by `t` (optionally first rotated by
/// `r`) and rebinning into the unit cell reproduces the same labelled
/// periodic graph; if so, returns the induced vertex permutation.
pub fn check_valid_translation(
    net: &CrystalNet,
    t: &Vec3Frac,
    r: Option<&IntMat3>,
) -> Option<Permutation> {
    let n = net.num_vertices();
    let mut mapping = vec![None; n];
    let mut shifts = vec![IntVec3::zeros(); n];
    let mut used = vec![false; n];

    for i in 0..n {
        let rotated = match r {
            Some(r) => rotate_vec3(r, &net.pos[i]),
            None => net.pos[i].clone(),
        };
        let raw = &rotated + t;
        let reduced = raw.fract_mod1();
        let shift = (&raw - &reduced).try_to_ints()?;
        let j = (0..n).find(|&j| net.pos[j] == reduced)?;
        if used[j] {
            return None;
        }
        used[j] = true;
        mapping[i] = Some(j);
        shifts[i] = shift;
    }
    let mapping: Vec<usize> = mapping.into_iter().collect::<Option<_>>()?;

    for (s, d, ofs) in net.graph.half_edges() {
        let rotated_ofs = match r {
            Some(r) => rotate_ofs(r, &ofs),
            None => ofs,
        };
        let new_ofs = rotated_ofs + shifts[d] - shifts[s];
        if !net.graph.has_edge(mapping[s], mapping[d], new_ofs) {
            return None;
        }
    }

    Some(Permutation::new(mapping))
}

/// Repeatedly quotient `net` by every valid translation found, until no
/// non-trivial translation remains. A no-op if `net` is already primitive.
pub fn minimize(net: &CrystalNet, ctx: &GenomeContext) -> Result<CrystalNet, GenomeError> {
    let mut current = net.clone();
    loop {
        let candidates = possible_translations(&current);
        let valid: Vec<Vec3Frac> = candidates
            .into_iter()
            .filter(|t| check_valid_translation(&current, t, None).is_some())
            .collect();
        if valid.is_empty() {
            return Ok(current);
        }

        let matrix = transformation_matrix_from_translations(&valid, ctx)?;
        let nv_before = current.num_vertices();
        current = reduce_with_matrix(&current, &matrix)?;
        if current.num_vertices() >= nv_before {
            return Err(GenomeError::InternalError(
                "primitive-cell reduction did not shrink the vertex count".to_string(),
            ));
        }
    }
}

/// Recover a minimal-volume integer matrix `M` whose columns span
/// `translations` (plus the three unit-cell axes as a fallback spanning set)
/// via the Hermite normal form of their common-denominator-scaled columns.
fn transformation_matrix_from_translations(
    translations: &[Vec3Frac],
    ctx: &GenomeContext,
) -> Result<IntMat3, GenomeError> {
    let d = common_denominator(translations);
    if (d.bits() as u32) > ctx.max_denominator_bits {
        return Err(GenomeError::InternalError(
            "translation denominator exceeds the configured maximum width".to_string(),
        ));
    }
    let d_i32 = d.to_i32().ok_or_else(|| {
        GenomeError::InternalError("translation denominator does not fit in i32".to_string())
    })?;

    let mut columns: Vec<IntVec3> = vec![
        IntVec3::new(d_i32, 0, 0),
        IntVec3::new(0, d_i32, 0),
        IntVec3::new(0, 0, d_i32),
    ];
    for t in translations {
        let scaled = scale_by_denominator(t, &d).ok_or_else(|| {
            GenomeError::InternalError(
                "translation is not exactly representable at its own denominator".to_string(),
            )
        })?;
        columns.push(scaled);
    }

    let basis = OMatrix::<i32, U3, Dyn>::from_columns(&columns);
    let hnf = crate::math::HNF::new(&basis);

    let d_frac = Frac::from(d);
    let trans_mat_inv = Mat3Frac::from_columns(
        hnf_column_to_vec3frac(&hnf.h, 0, &d_frac),
        hnf_column_to_vec3frac(&hnf.h, 1, &d_frac),
        hnf_column_to_vec3frac(&hnf.h, 2, &d_frac),
    );
    let trans_mat = trans_mat_inv.try_inverse().ok_or_else(|| {
        GenomeError::InternalError("translation basis is singular".to_string())
    })?;
    trans_mat.try_to_int_matrix().ok_or_else(|| {
        GenomeError::InternalError(
            "primitive-cell reduction matrix is not integral".to_string(),
        )
    })
}

fn hnf_column_to_vec3frac(h: &OMatrix<i32, U3, Dyn>, col: usize, d: &Frac) -> Vec3Frac {
    Vec3Frac([
        Frac::from(BigInt::from(h[(0, col)])) / d,
        Frac::from(BigInt::from(h[(1, col)])) / d,
        Frac::from(BigInt::from(h[(2, col)])) / d,
    ])
}

fn scale_by_denominator(t: &Vec3Frac, d: &BigInt) -> Option<IntVec3> {
    let d_frac = Frac::from(d.clone());
    let scaled = Vec3Frac([&t.0[0] * &d_frac, &t.0[1] * &d_frac, &t.0[2] * &d_frac]);
    scaled.try_to_ints()
}

fn common_denominator(translations: &[Vec3Frac]) -> BigInt {
    let mut d = BigInt::one();
    for t in translations {
        for c in &t.0 {
            d = lcm(&d, c.denom());
        }
    }
    d
}

fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
    let (mut a, mut b) = (a.clone(), b.clone());
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    if a.sign() == num_bigint::Sign::Minus {
        -a
    } else {
        a
    }
}

fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    let g = gcd(a, b);
    let product = a * b;
    let q = &product / &g;
    if q.sign() == num_bigint::Sign::Minus {
        -q
    } else {
        q
    }
}

/// Quotient `net` by the integer matrix `m`: fractional positions transform
/// as `new_frac = m * old_frac (mod 1)`, old vertices with equal `new_frac`
/// merge into one vertex, and edge offsets transform as
/// `new_ofs = m * ofs + shift(dst) - shift(src)` where `shift(i)` is the
/// integer part of `m * pos[i]` folded back into `[0, 1)`.
pub fn reduce_with_matrix(net: &CrystalNet, m: &IntMat3) -> Result<CrystalNet, GenomeError> {
    let n = net.num_vertices();
    let mut new_frac = Vec::with_capacity(n);
    let mut shifts = Vec::with_capacity(n);
    for i in 0..n {
        let raw = rotate_vec3(m, &net.pos[i]);
        let reduced = raw.fract_mod1();
        let shift = (&raw - &reduced).try_to_ints().ok_or_else(|| {
            GenomeError::InternalError(
                "reduction matrix produced a non-integer cell shift".to_string(),
            )
        })?;
        new_frac.push(reduced);
        shifts.push(shift);
    }

    let mut old_to_new: Vec<Option<usize>> = vec![None; n];
    let mut representative_of: Vec<usize> = Vec::new();
    let mut class_size: Vec<usize> = Vec::new();
    for i in 0..n {
        if let Some(existing) = representative_of
            .iter()
            .position(|&rep| new_frac[rep] == new_frac[i])
        {
            old_to_new[i] = Some(existing);
            class_size[existing] += 1;
        } else {
            old_to_new[i] = Some(representative_of.len());
            representative_of.push(i);
            class_size.push(1);
        }
    }
    let new_n = representative_of.len();
    let old_to_new: Vec<usize> = old_to_new.into_iter().map(|v| v.unwrap()).collect();

    if new_n == 0 || n % new_n != 0 {
        return Err(GenomeError::InternalError(
            "primitive-cell reduction did not partition vertices evenly".to_string(),
        ));
    }
    let expected_size = n / new_n;
    if class_size.iter().any(|&s| s != expected_size) {
        return Err(GenomeError::InternalError(
            "primitive-cell reduction classes have unequal size".to_string(),
        ));
    }

    let mut graph = crate::base::PeriodicGraph3D::new(new_n);
    for (new_u, &rep) in representative_of.iter().enumerate() {
        for &(d_old, ofs) in net.graph.neighbours(rep) {
            let new_ofs = rotate_ofs(m, &ofs) + shifts[d_old] - shifts[rep];
            let new_d = old_to_new[d_old];
            if new_u == new_d && new_ofs == IntVec3::zeros() {
                continue;
            }
            graph.add_edge(new_u, new_d, new_ofs);
        }
    }

    let types = representative_of.iter().map(|&rep| net.types[rep]).collect();
    let pos = representative_of.iter().map(|&rep| new_frac[rep].clone()).collect();

    let cell = net.cell.clone();
    CrystalNet::new(cell, types, pos, graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{frac, Mat3Frac};

    fn cubic_cell() -> Cell {
        Cell::new(Mat3Frac::identity()).unwrap()
    }

    fn pcu_net() -> CrystalNet {
        let graph = crate::base::PeriodicGraph3D::from_edges(
            1,
            &[
                (0, 0, IntVec3::new(1, 0, 0)),
                (0, 0, IntVec3::new(0, 1, 0)),
                (0, 0, IntVec3::new(0, 0, 1)),
            ],
        );
        CrystalNet::new(cubic_cell(), vec![0], vec![Vec3Frac::zero()], graph).unwrap()
    }

    /// The doubled-pcu scenario of the end-to-end test suite: two vertices
    /// related by the translation `(1/2, 0, 0)`, one unit cell doubled along
    /// x relative to `pcu_net`.
    fn doubled_pcu_net() -> CrystalNet {
        let graph = crate::base::PeriodicGraph3D::from_edges(
            2,
            &[
                (0, 1, IntVec3::new(0, 0, 0)),
                (1, 0, IntVec3::new(1, 0, 0)),
                (0, 0, IntVec3::new(0, 1, 0)),
                (0, 0, IntVec3::new(0, 0, 1)),
                (1, 1, IntVec3::new(0, 1, 0)),
                (1, 1, IntVec3::new(0, 0, 1)),
            ],
        );
        CrystalNet::new(
            cubic_cell(),
            vec![0, 0],
            vec![Vec3Frac::zero(), Vec3Frac([frac(1, 2), frac(0, 1), frac(0, 1)])],
            graph,
        )
        .unwrap()
    }

    #[test]
    fn test_pcu_has_no_nontrivial_translation() {
        let net = pcu_net();
        let candidates = possible_translations(&net);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_doubled_pcu_translation_is_valid() {
        let net = doubled_pcu_net();
        let candidates = possible_translations(&net);
        assert_eq!(candidates, vec![Vec3Frac([frac(1, 2), frac(0, 1), frac(0, 1)])]);
        let perm = check_valid_translation(&net, &candidates[0], None).unwrap();
        assert_eq!(perm.apply(0), 1);
        assert_eq!(perm.apply(1), 0);
    }

    #[test]
    fn test_minimize_doubled_pcu_reduces_to_pcu() {
        let net = doubled_pcu_net();
        let ctx = GenomeContext::default();
        let reduced = minimize(&net, &ctx).unwrap();
        assert_eq!(reduced.num_vertices(), 1);
        assert_eq!(reduced.pos[0], Vec3Frac::zero());
        assert_eq!(reduced.graph.degree(0), 6);
    }

    #[test]
    fn test_minimize_pcu_is_a_no_op() {
        let net = pcu_net();
        let ctx = GenomeContext::default();
        let reduced = minimize(&net, &ctx).unwrap();
        assert_eq!(reduced.num_vertices(), 1);
        assert_eq!(reduced.graph.degree(0), 6);
    }
}
