use std::collections::BTreeSet;

use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{
    DEFAULT_OCTREE_MAX_DEPTH, DEFAULT_OCTREE_MAX_STORAGE, MAX_OCTREE_DEPTH,
    PARALLEL_CHAMBER_THRESHOLD,
};
use crate::error::{Result, SpotError};

use super::aabb::Aabb;
use super::ellipsoid::Ellipsoid;

/// Number of children of a split node.
const MULTIPLICITY: usize = 8;

/// Order-normalized pair of arena indices `(low, high)`.
pub type CollisionPair = (usize, usize);

/// Recursive 8-way spatial index over ellipsoids held in a caller-owned arena.
///
/// The tree stores indices into a `&[Ellipsoid]` slice and never owns the
/// shapes; the same slice must be passed to every call that inspects them.
/// Stored indices past the end of the slice given to a call are skipped by
/// that call, and a split drops them from the tree.
///
/// An index is stored in every leaf ("chamber") whose box collides with the
/// shape's bounding box. Two ellipsoids that intersect therefore always share
/// at least one chamber, which is what makes the per-chamber pairwise test in
/// [`Octree::collisions`] a complete broad phase.
#[derive(Clone, Debug)]
pub struct Octree {
    bounds: Aabb,
    depth: usize,
    max_depth: usize,
    max_storage: usize,
    children: Vec<Octree>,
    data: Vec<usize>,
}

impl Octree {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            depth: 0,
            max_depth: DEFAULT_OCTREE_MAX_DEPTH,
            max_storage: DEFAULT_OCTREE_MAX_STORAGE,
            children: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn with_limits(bounds: Aabb, max_depth: usize, max_storage: usize) -> Result<Self> {
        let mut tree = Self::new(bounds);
        tree.set_max_depth(max_depth)?;
        tree.set_max_storage(max_storage)?;
        Ok(tree)
    }

    fn child(&self, sector: usize) -> Self {
        Self {
            bounds: self.bounds.octant(sector),
            depth: self.depth + 1,
            max_depth: self.max_depth,
            max_storage: self.max_storage,
            children: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Must be called before the tree is populated.
    pub fn set_max_depth(&mut self, max_depth: usize) -> Result<()> {
        if max_depth == 0 {
            return Err(SpotError::InvalidConfig(
                "octree depth must be at least 1".into(),
            ));
        }
        if max_depth > MAX_OCTREE_DEPTH {
            return Err(SpotError::InvalidConfig(format!(
                "octree depth {max_depth} exceeds {MAX_OCTREE_DEPTH}"
            )));
        }
        self.max_depth = max_depth;
        Ok(())
    }

    /// Must be called before the tree is populated.
    pub fn set_max_storage(&mut self, max_storage: usize) -> Result<()> {
        if max_storage == 0 {
            return Err(SpotError::InvalidConfig(
                "octree storage must be at least 1".into(),
            ));
        }
        self.max_storage = max_storage;
        Ok(())
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_storage(&self) -> usize {
        self.max_storage
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn children(&self) -> &[Octree] {
        &self.children
    }

    /// Arena indices held by this node (empty for split nodes).
    pub fn data(&self) -> &[usize] {
        &self.data
    }

    /// Insert `shapes[id]` into every chamber its bounding box touches.
    ///
    /// Returns `false` if the shape lies entirely outside the tree (or `id`
    /// is not in the arena).
    pub fn insert(&mut self, id: usize, shapes: &[Ellipsoid]) -> bool {
        let Some(shape) = shapes.get(id) else {
            return false;
        };
        self.insert_box(id, shape.aabb(), shapes)
    }

    fn insert_box(&mut self, id: usize, aabb: &Aabb, shapes: &[Ellipsoid]) -> bool {
        if !self.bounds.collide(aabb) {
            return false;
        }
        if self.has_children() {
            for child in &mut self.children {
                child.insert_box(id, aabb, shapes);
            }
        } else {
            self.data.push(id);
            if self.data.len() > self.max_storage {
                self.split(shapes);
            }
        }
        true
    }

    // A chamber at max depth keeps growing past its storage limit.
    fn split(&mut self, shapes: &[Ellipsoid]) {
        if self.depth >= self.max_depth {
            return;
        }
        let mut children: Vec<Octree> = (0..MULTIPLICITY).map(|s| self.child(s)).collect();
        for &id in &self.data {
            let Some(shape) = shapes.get(id) else {
                continue;
            };
            for child in &mut children {
                child.insert_box(id, shape.aabb(), shapes);
            }
        }
        self.children = children;
        self.data.clear();
    }

    /// Erase `id` from every chamber holding it.
    pub fn remove(&mut self, id: usize) {
        self.data.retain(|&d| d != id);
        for child in &mut self.children {
            child.remove(id);
        }
    }

    /// Leaves of the tree, depth first, children in sector order.
    pub fn chambers(&self) -> Chambers<'_> {
        Chambers { stack: vec![self] }
    }

    pub fn num_chambers(&self) -> usize {
        if self.has_children() {
            self.children.iter().map(Octree::num_chambers).sum()
        } else {
            1
        }
    }

    /// Boxes of every node, root first.
    pub fn voxels(&self) -> Vec<&Aabb> {
        let mut voxels = vec![&self.bounds];
        for child in &self.children {
            voxels.extend(child.voxels());
        }
        voxels
    }

    /// Every distinct pair of intersecting ellipsoids sharing a chamber.
    pub fn collisions(&self, shapes: &[Ellipsoid]) -> BTreeSet<CollisionPair> {
        let collisions = self.collect_pairs(|chamber| chamber.chamber_collisions(shapes, None));
        debug!(collisions = collisions.len(), "Octree collisions detected");
        collisions
    }

    /// Same as [`Octree::collisions`], with the lower-index member of each
    /// tested pair scaled by `peak_end` and the other by `bkg_end`.
    pub fn collisions_scaled(
        &self,
        shapes: &[Ellipsoid],
        peak_end: f64,
        bkg_end: f64,
    ) -> BTreeSet<CollisionPair> {
        let collisions = self.collect_pairs(|chamber| {
            chamber.chamber_collisions(shapes, Some((peak_end, bkg_end)))
        });
        debug!(
            collisions = collisions.len(),
            peak_end, bkg_end, "Octree scaled collisions detected"
        );
        collisions
    }

    fn collect_pairs<F>(&self, per_chamber: F) -> BTreeSet<CollisionPair>
    where
        F: Fn(&Octree) -> Vec<CollisionPair> + Sync,
    {
        let chambers: Vec<&Octree> = self.chambers().filter(|c| c.data.len() > 1).collect();
        if chambers.len() >= PARALLEL_CHAMBER_THRESHOLD {
            chambers
                .par_iter()
                .map(|c| per_chamber(*c))
                .fold(BTreeSet::new, |mut acc, pairs| {
                    acc.extend(pairs);
                    acc
                })
                .reduce(BTreeSet::new, |mut a, b| {
                    a.extend(b);
                    a
                })
        } else {
            chambers.iter().flat_map(|c| per_chamber(*c)).collect()
        }
    }

    fn chamber_collisions(
        &self,
        shapes: &[Ellipsoid],
        scales: Option<(f64, f64)>,
    ) -> Vec<CollisionPair> {
        let mut pairs = Vec::new();
        for (i, &a) in self.data.iter().enumerate() {
            for &b in &self.data[i + 1..] {
                if a == b {
                    continue;
                }
                let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                let (Some(low), Some(high)) = (shapes.get(lo), shapes.get(hi)) else {
                    continue;
                };
                let hit = match scales {
                    None => low.collide(high),
                    Some((peak_end, bkg_end)) => {
                        let mut first = low.clone();
                        first.scale(peak_end);
                        let mut second = high.clone();
                        second.scale(bkg_end);
                        first.collide(&second)
                    }
                };
                if hit {
                    pairs.push((lo, hi));
                }
            }
        }
        pairs
    }

    /// Indices of stored ellipsoids intersecting `given`, visiting only the
    /// subtrees its bounding box touches.
    pub fn collisions_with(&self, given: &Ellipsoid, shapes: &[Ellipsoid]) -> BTreeSet<usize> {
        let mut hits = BTreeSet::new();
        self.collect_collisions_with(given, shapes, &mut hits);
        hits
    }

    fn collect_collisions_with(
        &self,
        given: &Ellipsoid,
        shapes: &[Ellipsoid],
        hits: &mut BTreeSet<usize>,
    ) {
        if !self.bounds.collide(given.aabb()) {
            return;
        }
        if self.has_children() {
            for child in &self.children {
                child.collect_collisions_with(given, shapes, hits);
            }
            return;
        }
        for &id in &self.data {
            if !hits.contains(&id) && shapes.get(id).is_some_and(|s| s.collide(given)) {
                hits.insert(id);
            }
        }
    }

    /// Whether `point` lies inside any stored ellipsoid.
    pub fn is_inside_object(&self, point: &Vector3<f64>, shapes: &[Ellipsoid]) -> bool {
        if !self.bounds.is_inside(point) {
            return false;
        }
        if self.has_children() {
            return self
                .children
                .iter()
                .any(|c| c.is_inside_object(point, shapes));
        }
        self.data
            .iter()
            .any(|&id| shapes.get(id).is_some_and(|s| s.is_inside(point)))
    }
}

/// Depth-first iterator over the leaves of an [`Octree`].
pub struct Chambers<'a> {
    stack: Vec<&'a Octree>,
}

impl<'a> Iterator for Chambers<'a> {
    type Item = &'a Octree;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if node.has_children() {
                self.stack.extend(node.children.iter().rev());
            } else {
                return Some(node);
            }
        }
        None
    }
}
