//! Parsing of a `CrystalNet` from a plain-text net file. This lives in the
//! CLI, not the core library: the core's contract (§1) is "consume a
//! `CrystalNet`, never touch a filesystem".
//!
//! Format (whitespace separated, `#` starts a comment to end of line):
//!
//! ```text
//! cell
//! a11 a12 a13
//! a21 a22 a23
//! a31 a32 a33
//! vertices
//! <type> <x> <y> <z>
//! ...
//! edges
//! <src> <dst> <ox> <oy> <oz>
//! ...
//! ```
//!
//! Coordinates and cell entries are integers or `p/q` fractions; vertex and
//! edge indices are 1-based, matching the genome string's external
//! numbering (§6), and are converted to the core's 0-based numbering here.
//!
//! Vertex positions are only used to satisfy `CrystalNet::new`'s shape
//! check: `GenomeDriver::run` recomputes the graph's equilibrium embedding
//! before canonicalizing, so a net file's position columns never influence
//! the resulting genome.

use anyhow::{bail, Context, Result};
use genome::base::{Cell, IntVec3, Mat3Frac, PeriodicGraph3D, Vec3Frac};
use genome::CrystalNet;

fn parse_frac(tok: &str) -> Result<genome::base::Frac> {
    match tok.split_once('/') {
        Some((n, d)) => {
            let n: i64 = n.parse().with_context(|| format!("bad numerator in '{tok}'"))?;
            let d: i64 = d.parse().with_context(|| format!("bad denominator in '{tok}'"))?;
            Ok(genome::base::frac(n, d))
        }
        None => {
            let n: i64 = tok.parse().with_context(|| format!("bad integer '{tok}'"))?;
            Ok(genome::base::frac(n, 1))
        }
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Parse `text` into a `CrystalNet`. Parse failures are reported as `Err`;
/// callers map these to exit code 5 (parse error) per §6/§7.
pub fn parse_net_file(text: &str) -> Result<CrystalNet> {
    let tokens: Vec<&str> = text
        .lines()
        .map(strip_comment)
        .flat_map(|l| l.split_whitespace())
        .collect();

    let mut i = 0;
    let next = |i: &mut usize| -> Result<&str> {
        let t = tokens.get(*i).copied().ok_or_else(|| anyhow::anyhow!("unexpected end of input"))?;
        *i += 1;
        Ok(t)
    };

    if next(&mut i)? != "cell" {
        bail!("expected 'cell' section header");
    }
    // Each of the three lines gives one lattice vector's Cartesian
    // components directly, so it becomes one column of `Cell::basis`.
    let mut lattice_vectors = Vec::with_capacity(3);
    for _ in 0..3 {
        let x = parse_frac(next(&mut i)?)?;
        let y = parse_frac(next(&mut i)?)?;
        let z = parse_frac(next(&mut i)?)?;
        lattice_vectors.push(Vec3Frac([x, y, z]));
    }
    let basis = Mat3Frac::from_columns(
        lattice_vectors[0].clone(),
        lattice_vectors[1].clone(),
        lattice_vectors[2].clone(),
    );
    let cell = Cell::new(basis).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    if next(&mut i)? != "vertices" {
        bail!("expected 'vertices' section header");
    }
    let mut types = Vec::new();
    let mut pos = Vec::new();
    loop {
        match tokens.get(i) {
            Some(&"edges") => {
                i += 1;
                break;
            }
            Some(_) => {
                let t: i32 = next(&mut i)?.parse().context("bad vertex type")?;
                let x = parse_frac(next(&mut i)?)?;
                let y = parse_frac(next(&mut i)?)?;
                let z = parse_frac(next(&mut i)?)?;
                types.push(t);
                pos.push(Vec3Frac([x, y, z]));
            }
            None => bail!("net file ended before an 'edges' section"),
        }
    }
    if types.is_empty() {
        bail!("net has zero vertices");
    }

    let mut edges = Vec::new();
    while i < tokens.len() {
        let s: usize = next(&mut i)?.parse().context("bad edge source index")?;
        let d: usize = next(&mut i)?.parse().context("bad edge destination index")?;
        let ox: i32 = next(&mut i)?.parse().context("bad edge offset x")?;
        let oy: i32 = next(&mut i)?.parse().context("bad edge offset y")?;
        let oz: i32 = next(&mut i)?.parse().context("bad edge offset z")?;
        if s == 0 || d == 0 || s > types.len() || d > types.len() {
            bail!("edge endpoint out of range: {s} {d}");
        }
        edges.push((s - 1, d - 1, IntVec3::new(ox, oy, oz)));
    }

    let graph = PeriodicGraph3D::from_edges(types.len(), &edges);
    CrystalNet::new(cell, types, pos, graph).map_err(|e| anyhow::anyhow!(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pcu() {
        let text = "\
cell
1 0 0
0 1 0
0 0 1
vertices
0 0 0 0
edges
1 1 1 0 0
1 1 0 1 0
1 1 0 0 1
";
        let net = parse_net_file(text).unwrap();
        assert_eq!(net.num_vertices(), 1);
        assert_eq!(net.graph.degree(0), 6);
    }

    #[test]
    fn test_parse_fractional_positions() {
        let text = "\
cell
1 0 0
0 1 0
0 0 1
vertices
0 0 0 0
0 1/4 1/4 1/4
edges
1 2 0 0 0
1 2 1 0 0
1 2 0 1 0
1 2 0 0 1
";
        let net = parse_net_file(text).unwrap();
        assert_eq!(net.num_vertices(), 2);
    }

    #[test]
    fn test_missing_edges_section_is_rejected() {
        let text = "cell\n1 0 0\n0 1 0\n0 0 1\nvertices\n0 0 0 0\n";
        assert!(parse_net_file(text).is_err());
    }

    #[test]
    fn test_zero_vertices_is_rejected() {
        let text = "cell\n1 0 0\n0 1 0\n0 0 1\nvertices\nedges\n";
        assert!(parse_net_file(text).is_err());
    }
}
