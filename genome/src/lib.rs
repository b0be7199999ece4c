#[allow(unused_imports)]
#[macro_use]
extern crate approx;

pub mod base;

mod archive;
mod candidate_key;
mod candidates;
mod driver;
mod equilibrium;
mod find_basis;
mod math;
mod partition;
mod symmetry;
mod translations;

pub use archive::{Archive, ArchiveEntry};
pub use base::{BondingMode, ClusteringMode, Cell, CrystalNet, GenomeContext, GenomeError, VertexType};
pub use driver::{GenomeDriver, TopologicalGenome};
pub use equilibrium::compute_equilibrium;
