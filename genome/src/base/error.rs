use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
/// Error types for the **genome** library
pub enum GenomeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("equilibrium placement is degenerate: two vertices share a position")]
    UnstableNet,
    #[error("edge offsets do not span a 3-dimensional lattice")]
    NotThreeDimensional,
    #[error("archive built by {found}, expected {expected}")]
    ArchiveVersionMismatch { expected: String, found: String },
    #[error("internal invariant violated: {0}")]
    InternalError(String),
}
