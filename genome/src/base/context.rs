//! Configuration threaded explicitly through the API; no process-wide
//! singletons (see the "No shared mutable global state" design note).

/// How atoms were grouped into the vertices the core actually sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusteringMode {
    /// Vertices are exactly the input atoms; no clustering performed.
    Input,
    /// One vertex per atom, ignoring any cluster hints in the input.
    EachAtom,
    /// Metal-organic-framework style clustering of secondary building units.
    Mof,
    /// Heuristically guessed clustering.
    Guess,
    /// Try `Guess`, falling back to `EachAtom` on failure.
    Auto,
}

/// How bonds were determined before the graph reached the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondingMode {
    /// Bonds were given directly in the input.
    Input,
    /// Bonds came from an external tool.
    External,
    /// Bonds were guessed from interatomic distances.
    Auto,
}

/// Parameters controlling the canonicalization search, passed explicitly
/// rather than read from a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomeContext {
    pub clustering: ClusteringMode,
    pub bonding: BondingMode,
    /// Reject inputs whose exact arithmetic would need a rational
    /// denominator wider than this many bits, rather than risk silently
    /// producing a wrong answer from an unbounded blow-up.
    pub max_denominator_bits: u32,
    /// Depth of the coordination sequence used to separate vertex classes
    /// in the partition step (see the Open Question in the design notes).
    pub coordination_sequence_depth: usize,
}

impl Default for GenomeContext {
    fn default() -> Self {
        Self {
            clustering: ClusteringMode::Auto,
            bonding: BondingMode::Auto,
            max_denominator_bits: 4096,
            coordination_sequence_depth: 10,
        }
    }
}
