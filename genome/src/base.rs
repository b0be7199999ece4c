mod arithmetic;
mod context;
mod error;
mod graph;
mod net;
mod permutation;

pub use arithmetic::{
    frac, int_det3, int_inverse_unimodular, rotate_vec3, Frac, IntMat3, IntVec3, Mat3Frac,
    Vec3Frac,
};
pub use context::{BondingMode, ClusteringMode, GenomeContext};
pub use error::GenomeError;
pub use graph::{HalfEdge, PeriodicGraph3D};
pub use net::{Cell, CrystalNet, VertexType};
pub use permutation::{orbits_from_permutations, Permutation};
