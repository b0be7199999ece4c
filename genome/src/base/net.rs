//! `Cell` and `CrystalNet`: the data model the core operates on (§3).

use super::arithmetic::{Frac, IntMat3, Mat3Frac, Vec3Frac};
use super::error::GenomeError;
use super::graph::PeriodicGraph3D;

/// A vertex label: an atomic number for atom-level nets, or an opaque
/// cluster kind for coarser nets. Opaque to the core beyond equality.
pub type VertexType = i32;

/// Lattice basis vectors in Cartesian space, stored as an exact-rational
/// matrix whose columns are the three basis vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub basis: Mat3Frac,
}

impl Cell {
    pub fn new(basis: Mat3Frac) -> Result<Self, GenomeError> {
        if basis.is_singular() {
            return Err(GenomeError::InvalidInput(
                "cell basis is singular".to_string(),
            ));
        }
        Ok(Self { basis })
    }

    /// Change basis: `cell.basis <- cell.basis * m`.
    pub fn change_basis(&self, m: &IntMat3) -> Self {
        let cols: Vec<Vec3Frac> = (0..3)
            .map(|j| {
                let mut acc = Vec3Frac::zero();
                for i in 0..3 {
                    let coeff = Frac::from(num_bigint::BigInt::from(m[(i, j)]));
                    acc = &acc + &scale(&self.basis.cols[i], &coeff);
                }
                acc
            })
            .collect();
        Self {
            basis: Mat3Frac::from_columns(cols[0].clone(), cols[1].clone(), cols[2].clone()),
        }
    }
}

fn scale(v: &Vec3Frac, k: &Frac) -> Vec3Frac {
    Vec3Frac([&v.0[0] * k, &v.0[1] * k, &v.0[2] * k])
}

/// A crystal's periodic graph together with its equilibrium embedding (§3).
#[derive(Debug, Clone)]
pub struct CrystalNet {
    pub cell: Cell,
    pub types: Vec<VertexType>,
    pub pos: Vec<Vec3Frac>,
    pub graph: PeriodicGraph3D,
}

impl CrystalNet {
    pub fn new(
        cell: Cell,
        types: Vec<VertexType>,
        pos: Vec<Vec3Frac>,
        graph: PeriodicGraph3D,
    ) -> Result<Self, GenomeError> {
        let n = graph.num_vertices();
        if types.len() != n || pos.len() != n {
            return Err(GenomeError::InvalidInput(format!(
                "expected {n} types and positions, got {} and {}",
                types.len(),
                pos.len()
            )));
        }
        if n == 0 {
            return Err(GenomeError::InvalidInput(
                "net has zero vertices".to_string(),
            ));
        }
        Ok(Self {
            cell,
            types,
            pos,
            graph,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.num_vertices()
    }

    /// `true` iff every equilibrium position is distinct (the net is
    /// "stable" in the terminology of §9/GLOSSARY).
    pub fn all_positions_distinct(&self) -> bool {
        for i in 0..self.pos.len() {
            for j in (i + 1)..self.pos.len() {
                if self.pos[i] == self.pos[j] {
                    return false;
                }
            }
        }
        true
    }
}
