//! Exact rational arithmetic for offsets, positions and basis changes.
//!
//! nalgebra's generic `Scalar` machinery is tuned for small `Copy` numeric
//! types (`f64`, `i32`); `BigRational` is heap-allocated and non-`Copy`, so
//! positions and bases use these small hand-rolled 3-vectors/3-matrices
//! instead of `nalgebra::Vector3<BigRational>`. Integer-only quantities
//! (rotations, lattice offsets, Hermite-normal-form matrices) continue to
//! use `nalgebra` exactly as the rest of the crate does.

use std::ops::{Add, Neg, Sub};

use nalgebra::{Matrix3, Vector3};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// An exact rational number, widened to arbitrary precision on demand.
pub type Frac = BigRational;

/// An integer lattice offset, `ofs ∈ ℤ³`.
pub type IntVec3 = Vector3<i32>;

/// An integer 3×3 matrix: a basis-change or point-symmetry rotation.
pub type IntMat3 = Matrix3<i32>;

/// Build an exact fraction `n/d`.
pub fn frac(n: i64, d: i64) -> Frac {
    Frac::new(BigInt::from(n), BigInt::from(d))
}

/// Three exact rationals; a fractional position or displacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vec3Frac(pub [Frac; 3]);

impl Vec3Frac {
    pub fn zero() -> Self {
        Self([Frac::zero(), Frac::zero(), Frac::zero()])
    }

    pub fn from_ints(v: &IntVec3) -> Self {
        Self([
            Frac::from(BigInt::from(v.x)),
            Frac::from(BigInt::from(v.y)),
            Frac::from(BigInt::from(v.z)),
        ])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| c.is_zero())
    }

    /// Reduce every component modulo 1 into `[0, 1)`.
    pub fn fract_mod1(&self) -> Self {
        Self([
            modulo_one(&self.0[0]),
            modulo_one(&self.0[1]),
            modulo_one(&self.0[2]),
        ])
    }

    /// Round every component to the nearest integer, failing if any
    /// component is not itself an integer.
    pub fn try_to_ints(&self) -> Option<IntVec3> {
        let x = to_exact_int(&self.0[0])?;
        let y = to_exact_int(&self.0[1])?;
        let z = to_exact_int(&self.0[2])?;
        Some(IntVec3::new(x, y, z))
    }
}

fn modulo_one(x: &Frac) -> Frac {
    let one = Frac::one();
    let mut r = x - (x.trunc());
    if r.is_negative() {
        r += &one;
    }
    if r >= one {
        r -= &one;
    }
    r
}

fn to_exact_int(x: &Frac) -> Option<i32> {
    if !x.is_integer() {
        return None;
    }
    x.to_integer().to_i32()
}

impl Add for &Vec3Frac {
    type Output = Vec3Frac;
    fn add(self, rhs: &Vec3Frac) -> Vec3Frac {
        Vec3Frac([
            &self.0[0] + &rhs.0[0],
            &self.0[1] + &rhs.0[1],
            &self.0[2] + &rhs.0[2],
        ])
    }
}

impl Sub for &Vec3Frac {
    type Output = Vec3Frac;
    fn sub(self, rhs: &Vec3Frac) -> Vec3Frac {
        Vec3Frac([
            &self.0[0] - &rhs.0[0],
            &self.0[1] - &rhs.0[1],
            &self.0[2] - &rhs.0[2],
        ])
    }
}

impl Neg for &Vec3Frac {
    type Output = Vec3Frac;
    fn neg(self) -> Vec3Frac {
        Vec3Frac([-&self.0[0], -&self.0[1], -&self.0[2]])
    }
}

/// A 3x3 exact-rational matrix, stored column-major to match the "columns
/// are basis vectors" convention used throughout the periodic-graph core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mat3Frac {
    pub cols: [Vec3Frac; 3],
}

impl Mat3Frac {
    pub fn from_columns(c0: Vec3Frac, c1: Vec3Frac, c2: Vec3Frac) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    pub fn identity() -> Self {
        Self::from_columns(
            Vec3Frac([Frac::one(), Frac::zero(), Frac::zero()]),
            Vec3Frac([Frac::zero(), Frac::one(), Frac::zero()]),
            Vec3Frac([Frac::zero(), Frac::zero(), Frac::one()]),
        )
    }

    fn at(&self, row: usize, col: usize) -> &Frac {
        &self.cols[col].0[row]
    }

    pub fn determinant(&self) -> Frac {
        let a = self.at(0, 0);
        let b = self.at(0, 1);
        let c = self.at(0, 2);
        let d = self.at(1, 0);
        let e = self.at(1, 1);
        let f = self.at(1, 2);
        let g = self.at(2, 0);
        let h = self.at(2, 1);
        let i = self.at(2, 2);
        a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
    }

    pub fn is_singular(&self) -> bool {
        self.determinant().is_zero()
    }

    /// Exact matrix inverse via the adjugate, or `None` if singular.
    pub fn try_inverse(&self) -> Option<Mat3Frac> {
        let det = self.determinant();
        if det.is_zero() {
            return None;
        }
        let m = |r: usize, c: usize| self.at(r, c).clone();
        let cof = |r: usize, c: usize| -> Frac {
            let rows: Vec<usize> = (0..3).filter(|&x| x != r).collect();
            let cols: Vec<usize> = (0..3).filter(|&x| x != c).collect();
            let minor = &m(rows[0], cols[0]) * &m(rows[1], cols[1])
                - &m(rows[0], cols[1]) * &m(rows[1], cols[0]);
            if (r + c) % 2 == 0 {
                minor
            } else {
                -minor
            }
        };
        // adjugate is the transpose of the cofactor matrix
        let mut inv_cols = [Vec3Frac::zero(), Vec3Frac::zero(), Vec3Frac::zero()];
        for col in 0..3 {
            for row in 0..3 {
                inv_cols[col].0[row] = cof(col, row) / &det;
            }
        }
        Some(Mat3Frac { cols: inv_cols })
    }

    pub fn mul_vec(&self, v: &Vec3Frac) -> Vec3Frac {
        let mut out = Vec3Frac::zero();
        for col in 0..3 {
            for row in 0..3 {
                out.0[row] = &out.0[row] + self.at(row, col) * &v.0[col];
            }
        }
        out
    }

    /// Matrix product `self * rhs`, applying `self` to each column of `rhs`.
    pub fn mul_mat(&self, rhs: &Mat3Frac) -> Mat3Frac {
        Mat3Frac {
            cols: [
                self.mul_vec(&rhs.cols[0]),
                self.mul_vec(&rhs.cols[1]),
                self.mul_vec(&rhs.cols[2]),
            ],
        }
    }

    /// Collapse to an integer matrix if every entry happens to be an
    /// integer, or `None` otherwise. Used to test whether a rotation
    /// derived from rational neighbour-offset bases is actually in
    /// `GL₃(ℤ)`.
    pub fn try_to_int_matrix(&self) -> Option<IntMat3> {
        let mut m = IntMat3::zeros();
        for (c, col) in self.cols.iter().enumerate() {
            let ints = col.try_to_ints()?;
            m[(0, c)] = ints.x;
            m[(1, c)] = ints.y;
            m[(2, c)] = ints.z;
        }
        Some(m)
    }
}

/// Determinant of an integer 3×3 matrix by cofactor expansion.
pub fn int_det3(m: &IntMat3) -> i32 {
    let a = m[(0, 0)];
    let b = m[(0, 1)];
    let c = m[(0, 2)];
    let d = m[(1, 0)];
    let e = m[(1, 1)];
    let f = m[(1, 2)];
    let g = m[(2, 0)];
    let h = m[(2, 1)];
    let i = m[(2, 2)];
    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}

/// Inverse of an integer matrix known to have determinant ±1, via the
/// adjugate, so the result is exact over ℤ without rational widening.
/// Returns `None` if the determinant isn't ±1.
pub fn int_inverse_unimodular(m: &IntMat3) -> Option<IntMat3> {
    let det = int_det3(m);
    if det != 1 && det != -1 {
        return None;
    }
    let cof = |r: usize, c: usize| -> i32 {
        let rows: Vec<usize> = (0..3).filter(|&x| x != r).collect();
        let cols: Vec<usize> = (0..3).filter(|&x| x != c).collect();
        let minor = m[(rows[0], cols[0])] * m[(rows[1], cols[1])]
            - m[(rows[0], cols[1])] * m[(rows[1], cols[0])];
        if (r + c) % 2 == 0 {
            minor
        } else {
            -minor
        }
    };
    let mut inv = IntMat3::zeros();
    for col in 0..3 {
        for row in 0..3 {
            inv[(row, col)] = cof(col, row) / det;
        }
    }
    Some(inv)
}

/// Apply an integer matrix to an exact-rational vector: `r * v`.
pub fn rotate_vec3(r: &IntMat3, v: &Vec3Frac) -> Vec3Frac {
    let mut out = Vec3Frac::zero();
    for row in 0..3 {
        let mut acc = out.0[row].clone();
        for col in 0..3 {
            let coeff = Frac::from(BigInt::from(r[(row, col)]));
            acc = acc + coeff * v.0[col].clone();
        }
        out.0[row] = acc;
    }
    out
}
