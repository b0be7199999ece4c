use std::collections::BTreeMap;
use std::ops::Mul;

use union_find::{QuickFindUf, UnionByRank, UnionFind};

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Permutation {
    mapping: Vec<usize>,
}

impl Permutation {
    pub fn new(mapping: Vec<usize>) -> Self {
        Self { mapping }
    }

    pub fn identity(size: usize) -> Self {
        Self::new((0..size).collect())
    }

    pub fn size(&self) -> usize {
        self.mapping.len()
    }

    pub fn apply(&self, i: usize) -> usize {
        self.mapping[i]
    }

    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.size()];
        for (i, &j) in self.mapping.iter().enumerate() {
            inv[j] = i;
        }
        Self::new(inv)
    }
}

impl Mul for Permutation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let mapping = (0..self.size()).map(|i| self.apply(rhs.apply(i))).collect();
        Self::new(mapping)
    }
}

/// If and only if the `i`th and `j`th vertices lie in the same orbit under the
/// given permutations, `orbits[i] == orbits[j]`. For each orbit, exactly one
/// member satisfies `orbits[i] == i` (its lowest-indexed representative).
pub fn orbits_from_permutations(num_vertices: usize, permutations: &[Permutation]) -> Vec<usize> {
    let mut uf = QuickFindUf::<UnionByRank>::new(num_vertices);
    for permutation in permutations.iter() {
        for i in 0..num_vertices {
            uf.union(i, permutation.apply(i));
        }
    }
    let mut representative_of = BTreeMap::new();
    for i in 0..num_vertices {
        representative_of.entry(uf.find(i)).or_insert(i);
    }

    (0..num_vertices)
        .map(|i| *representative_of.get(&uf.find(i)).unwrap())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::vec;

    use super::{orbits_from_permutations, Permutation};

    #[test]
    fn test_permutation() {
        let permutation = Permutation::new(vec![1, 2, 0]);
        assert_eq!(permutation.apply(0), 1);
        assert_eq!(permutation.inverse(), Permutation::new(vec![2, 0, 1]));
        assert_eq!(
            permutation.clone() * permutation.inverse(),
            Permutation::identity(3)
        );
    }

    #[test]
    fn test_orbits_from_permutations() {
        let permutations = vec![Permutation::new(vec![1, 0, 2, 3])];
        assert_eq!(orbits_from_permutations(4, &permutations), vec![0, 0, 2, 3]);
    }
}
