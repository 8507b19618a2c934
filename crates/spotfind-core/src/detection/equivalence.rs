use std::collections::BTreeMap;

/// Discovered "these two labels are the same object" facts, stored as
/// `(higher, lower)` pairs.
#[derive(Clone, Debug, Default)]
pub struct EquivalenceList {
    pairs: Vec<(usize, usize)>,
}

impl EquivalenceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `a` and `b` label the same object. Self-pairs are ignored.
    pub fn register(&mut self, a: usize, b: usize) {
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => self.pairs.push((a, b)),
            std::cmp::Ordering::Less => self.pairs.push((b, a)),
            std::cmp::Ordering::Equal => {}
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Sort and drop repeated pairs.
    pub fn dedup(&mut self) {
        self.pairs.sort_unstable();
        self.pairs.dedup();
    }

    /// Map every label that is not the canonical member of its class to the
    /// canonical one (the smallest label of the connected component).
    ///
    /// Labels absent from the result are canonical. Chains of any length
    /// resolve to one root.
    pub fn reduce(&self) -> BTreeMap<usize, usize> {
        let mut sets = DisjointSet::default();
        for &(hi, lo) in &self.pairs {
            sets.union(hi, lo);
        }
        sets.flatten()
    }
}

/// Union-find over sparse labels.
#[derive(Default)]
struct DisjointSet {
    parent: BTreeMap<usize, usize>,
}

impl DisjointSet {
    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        // Path compression.
        let mut node = x;
        while node != root {
            let next = self.parent.get(&node).copied().unwrap_or(root);
            self.parent.insert(node, root);
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        self.parent.entry(a).or_insert(a);
        self.parent.entry(b).or_insert(b);
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Smaller root wins to keep labels canonical.
            let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent.insert(big, small);
        }
    }

    fn flatten(mut self) -> BTreeMap<usize, usize> {
        let labels: Vec<usize> = self.parent.keys().copied().collect();
        labels
            .into_iter()
            .filter_map(|label| {
                let root = self.find(label);
                (root != label).then_some((label, root))
            })
            .collect()
    }
}
