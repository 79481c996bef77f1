/// Disjoint-set forest over `0..n`.
///
/// The root of every class is its smallest member, so class
/// representatives do not depend on the order of unions.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    /// Root of `x`, halving the path on the way up.
    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            let grand = self.parent[self.parent[x]];
            self.parent[x] = grand;
            x = grand;
        }
        x
    }

    /// Joins the classes of `a` and `b`. Returns `false` if they already
    /// were one class.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi] = lo;
        true
    }

    /// Classes with more than one member, each sorted, ordered by their
    /// smallest member.
    pub(crate) fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); n];
        for i in 0..n {
            let r = self.find(i);
            by_root[r].push(i);
        }
        by_root.into_iter().filter(|g| g.len() > 1).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_collapse_to_smallest_member() {
        let mut uf = UnionFind::new(6);
        assert!(uf.union(4, 5));
        assert!(uf.union(5, 2));
        assert!(!uf.union(2, 4));
        assert!(uf.union(0, 1));
        assert_eq!(uf.find(5), 2);
        assert_eq!(uf.groups(), vec![vec![0, 1], vec![2, 4, 5]]);
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let n = 100_000;
        let mut uf = UnionFind::new(n);
        for i in (1..n).rev() {
            uf.union(i, i - 1);
        }
        assert_eq!(uf.find(n - 1), 0);
    }
}
