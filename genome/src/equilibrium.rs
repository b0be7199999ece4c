//! Barycentric (equilibrium) vertex placement by exact rational linear
//! solve over the graph Laplacian (§4.2). Grounded on the problem shape of
//! `math::IntegerLinearSystem` — solve a linear system and read off the
//! solution — but over `BigRational` rather than an integer nullspace,
//! since equilibrium positions are genuinely fractional.

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::base::{Frac, GenomeError, PeriodicGraph3D, Vec3Frac};

/// Solve for every vertex's equilibrium position with `pos[0]` fixed at the
/// origin: each vertex sits at the average of its neighbours, including the
/// periodic offset contribution.
///
/// This is `(deg(i)) pos[i] - sum_{(w,o)} pos[w] = sum_{(w,o)} o` for every
/// `i != 0`, one independent copy per Cartesian component. `pos[0] = 0`
/// removes the Laplacian's dimension-3 translational null space.
pub fn compute_equilibrium(graph: &PeriodicGraph3D) -> Result<Vec<Vec3Frac>, GenomeError> {
    let n = graph.num_vertices();
    if n == 0 {
        return Err(GenomeError::InvalidInput(
            "net has zero vertices".to_string(),
        ));
    }
    if n == 1 {
        return Ok(vec![Vec3Frac::zero()]);
    }

    let dim = n - 1;
    let mut matrix: Vec<Vec<Frac>> = vec![vec![Frac::zero(); dim]; dim];
    let mut rhs: Vec<[Frac; 3]> = vec![[Frac::zero(), Frac::zero(), Frac::zero()]; dim];

    for i in 1..n {
        let row = i - 1;
        for &(w, ofs) in graph.neighbours(i) {
            matrix[row][row] = matrix[row][row].clone() + Frac::one();
            if w != 0 {
                let col = w - 1;
                matrix[row][col] = matrix[row][col].clone() - Frac::one();
            }
            rhs[row][0] = rhs[row][0].clone() + Frac::from(BigInt::from(ofs.x));
            rhs[row][1] = rhs[row][1].clone() + Frac::from(BigInt::from(ofs.y));
            rhs[row][2] = rhs[row][2].clone() + Frac::from(BigInt::from(ofs.z));
        }
    }

    let solved = solve_exact(matrix, rhs)?;

    let mut pos = Vec::with_capacity(n);
    pos.push(Vec3Frac::zero());
    for [x, y, z] in solved {
        pos.push(Vec3Frac([x, y, z]).fract_mod1());
    }

    if has_duplicate(&pos) {
        return Err(GenomeError::UnstableNet);
    }
    Ok(pos)
}

fn has_duplicate(pos: &[Vec3Frac]) -> bool {
    for i in 0..pos.len() {
        for j in (i + 1)..pos.len() {
            if pos[i] == pos[j] {
                return true;
            }
        }
    }
    false
}

/// Gauss-Jordan elimination of `matrix * x = rhs` over exact rationals. A
/// connected net's reduced Laplacian is always invertible; a missing pivot
/// means the net fed in is disconnected, which the caller should never do.
fn solve_exact(
    mut matrix: Vec<Vec<Frac>>,
    mut rhs: Vec<[Frac; 3]>,
) -> Result<Vec<[Frac; 3]>, GenomeError> {
    let dim = matrix.len();
    for col in 0..dim {
        let pivot_row = (col..dim).find(|&r| !matrix[r][col].is_zero());
        let pivot_row = pivot_row.ok_or_else(|| {
            GenomeError::InternalError(
                "reduced Laplacian is singular; net is disconnected".to_string(),
            )
        })?;
        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        let pivot = matrix[col][col].clone();
        for j in col..dim {
            matrix[col][j] = &matrix[col][j] / &pivot;
        }
        for k in 0..3 {
            rhs[col][k] = &rhs[col][k] / &pivot;
        }

        for r in 0..dim {
            if r == col {
                continue;
            }
            let factor = matrix[r][col].clone();
            if factor.is_zero() {
                continue;
            }
            for j in col..dim {
                matrix[r][j] = &matrix[r][j] - &(&factor * &matrix[col][j]);
            }
            for k in 0..3 {
                rhs[r][k] = &rhs[r][k] - &(&factor * &rhs[col][k]);
            }
        }
    }
    Ok(rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{frac, IntVec3};

    #[test]
    fn test_single_vertex_net() {
        let g = PeriodicGraph3D::from_edges(
            1,
            &[
                (0, 0, IntVec3::new(1, 0, 0)),
                (0, 0, IntVec3::new(0, 1, 0)),
                (0, 0, IntVec3::new(0, 0, 1)),
            ],
        );
        let pos = compute_equilibrium(&g).unwrap();
        assert_eq!(pos, vec![Vec3Frac::zero()]);
    }

    #[test]
    fn test_diamond_net_quarter_positions() {
        let g = PeriodicGraph3D::from_edges(
            2,
            &[
                (0, 1, IntVec3::new(0, 0, 0)),
                (0, 1, IntVec3::new(1, 0, 0)),
                (0, 1, IntVec3::new(0, 1, 0)),
                (0, 1, IntVec3::new(0, 0, 1)),
            ],
        );
        let pos = compute_equilibrium(&g).unwrap();
        assert_eq!(pos[0], Vec3Frac::zero());
        assert_eq!(pos[1], Vec3Frac([frac(1, 4), frac(1, 4), frac(1, 4)]));
    }

    #[test]
    fn test_coincident_positions_are_unstable() {
        let g = PeriodicGraph3D::from_edges(2, &[(0, 1, IntVec3::zeros())]);
        let err = compute_equilibrium(&g).unwrap_err();
        assert_eq!(err, GenomeError::UnstableNet);
    }

    #[test]
    fn test_disconnected_net_is_internal_error() {
        let g = PeriodicGraph3D::from_edges(3, &[(0, 1, IntVec3::zeros())]);
        let err = compute_equilibrium(&g).unwrap_err();
        assert!(matches!(err, GenomeError::InternalError(_)));
    }
}
