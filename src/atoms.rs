//! Atoms, the validated per-call atom set, and atom filters.

use crate::error::SesError;
use nalgebra::Point3;
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// A sphere with a van der Waals radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Atom {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl Atom {
    pub fn new(x: f32, y: f32, z: f32, radius: f32) -> Self {
        Self {
            center: Point3::new(x, y, z),
            radius,
        }
    }
}

type IndexedPoint = GeomWithData<[f32; 3], usize>;

/// Immutable view over a slice of atoms together with the probe radius.
///
/// Construction validates every atom, so all downstream geometry can assume
/// finite centers and strictly positive extended radii. The set also carries
/// an R-tree over the atom centers used to find overlapping neighbors.
pub struct AtomSet<'a> {
    atoms: &'a [Atom],
    probe_radius: f32,
    max_extended_radius: f32,
    tree: RTree<IndexedPoint>,
}

impl<'a> AtomSet<'a> {
    /// Validate `atoms` and index them for neighbor queries.
    ///
    /// # Errors
    ///
    /// Returns [`SesError::EmptyAtomSet`] for an empty slice,
    /// [`SesError::InvalidProbeRadius`] for a negative or non-finite probe,
    /// and [`SesError::NonFiniteCoordinate`] / [`SesError::InvalidRadius`] for
    /// the first malformed atom.
    pub fn new(atoms: &'a [Atom], probe_radius: f32) -> Result<Self, SesError> {
        if atoms.is_empty() {
            return Err(SesError::EmptyAtomSet);
        }
        if !probe_radius.is_finite() || probe_radius < 0.0 {
            return Err(SesError::InvalidProbeRadius(probe_radius));
        }
        for (index, atom) in atoms.iter().enumerate() {
            if !atom.center.coords.iter().all(|c| c.is_finite()) {
                return Err(SesError::NonFiniteCoordinate { index });
            }
            if !atom.radius.is_finite() || atom.radius <= 0.0 {
                return Err(SesError::InvalidRadius {
                    index,
                    radius: atom.radius,
                });
            }
        }

        let max_radius = atoms.iter().map(|a| a.radius).fold(0.0, f32::max);
        let tree = RTree::bulk_load(
            atoms
                .iter()
                .enumerate()
                .map(|(i, a)| IndexedPoint::new([a.center.x, a.center.y, a.center.z], i))
                .collect(),
        );

        Ok(Self {
            atoms,
            probe_radius,
            max_extended_radius: max_radius + probe_radius,
            tree,
        })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Always false; an empty set is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &'a [Atom] {
        self.atoms
    }

    pub fn probe_radius(&self) -> f32 {
        self.probe_radius
    }

    pub fn center(&self, index: usize) -> Point3<f32> {
        self.atoms[index].center
    }

    /// Van der Waals radius of atom `index`.
    pub fn radius(&self, index: usize) -> f32 {
        self.atoms[index].radius
    }

    /// Radius of atom `index` grown by the probe radius.
    pub fn extended_radius(&self, index: usize) -> f32 {
        self.atoms[index].radius + self.probe_radius
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), SesError> {
        if index < self.atoms.len() {
            Ok(())
        } else {
            Err(SesError::IndexOutOfRange {
                index,
                len: self.atoms.len(),
            })
        }
    }

    /// Whether the extended spheres of `i` and `j` overlap.
    ///
    /// Touching spheres (distance exactly equal to the radius sum) do not
    /// overlap.
    pub fn overlaps(&self, i: usize, j: usize) -> bool {
        let reach = self.extended_radius(i) + self.extended_radius(j);
        nalgebra::distance_squared(&self.center(i), &self.center(j)) < reach * reach
    }

    /// Indices of all other atoms whose extended spheres overlap atom `index`,
    /// in ascending order.
    ///
    /// Atoms sharing the center of `index` are included; the geometry built
    /// from them is rejected later as degenerate.
    pub fn overlapping(&self, index: usize) -> Vec<usize> {
        let center = self.center(index);
        let reach = self.extended_radius(index) + self.max_extended_radius;
        let mut neighbors: Vec<usize> = self
            .tree
            .locate_within_distance([center.x, center.y, center.z], reach * reach)
            .map(|p| p.data)
            .filter(|&j| j != index && self.overlaps(index, j))
            .collect();
        neighbors.sort_unstable();
        neighbors
    }
}

/// Subset of atoms allowed to take part in a computation.
///
/// Typically produced by an external visibility pass. A pair or triple is
/// considered only when every member is admitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtomFilter {
    mask: Vec<bool>,
}

impl AtomFilter {
    /// Build a filter from one flag per atom.
    pub fn from_mask(mask: Vec<bool>, n_atoms: usize) -> Result<Self, SesError> {
        if mask.len() != n_atoms {
            return Err(SesError::FilterLengthMismatch {
                expected: n_atoms,
                found: mask.len(),
            });
        }
        Ok(Self { mask })
    }

    /// Build a filter admitting exactly `indices`.
    pub fn from_indices<I>(indices: I, n_atoms: usize) -> Result<Self, SesError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut mask = vec![false; n_atoms];
        for index in indices {
            match mask.get_mut(index) {
                Some(flag) => *flag = true,
                None => {
                    return Err(SesError::IndexOutOfRange {
                        index,
                        len: n_atoms,
                    })
                }
            }
        }
        Ok(Self { mask })
    }

    /// Build a filter admitting every atom except `excluded`.
    pub fn excluding<I>(excluded: I, n_atoms: usize) -> Result<Self, SesError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut filter = Self::from_indices(excluded, n_atoms)?;
        filter.mask.iter_mut().for_each(|flag| *flag = !*flag);
        Ok(filter)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    /// Number of admitted atoms.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&flag| flag).count()
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub(crate) fn check_len(&self, n_atoms: usize) -> Result<(), SesError> {
        if self.mask.len() == n_atoms {
            Ok(())
        } else {
            Err(SesError::FilterLengthMismatch {
                expected: n_atoms,
                found: self.mask.len(),
            })
        }
    }
}

/// Whether `index` passes an optional filter.
pub(crate) fn admits(filter: Option<&AtomFilter>, index: usize) -> bool {
    filter.map_or(true, |f| f.contains(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(AtomSet::new(&[], 1.4).err(), Some(SesError::EmptyAtomSet));

        let atoms = [Atom::new(0.0, 0.0, 0.0, 1.5)];
        assert_eq!(
            AtomSet::new(&atoms, -0.1).err(),
            Some(SesError::InvalidProbeRadius(-0.1))
        );

        let atoms = [Atom::new(0.0, 0.0, 0.0, 1.5), Atom::new(1.0, 0.0, 0.0, -1.0)];
        assert_eq!(
            AtomSet::new(&atoms, 1.4).err(),
            Some(SesError::InvalidRadius {
                index: 1,
                radius: -1.0
            })
        );

        let atoms = [Atom::new(f32::NAN, 0.0, 0.0, 1.5)];
        assert_eq!(
            AtomSet::new(&atoms, 1.4).err(),
            Some(SesError::NonFiniteCoordinate { index: 0 })
        );
    }

    #[test]
    fn test_zero_probe_radius_is_valid() {
        let atoms = [Atom::new(0.0, 0.0, 0.0, 1.5)];
        let set = AtomSet::new(&atoms, 0.0).unwrap();
        assert!((set.extended_radius(0) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_matches_brute_force() {
        let atoms: Vec<Atom> = (0..40)
            .map(|i| {
                let t = i as f32;
                Atom::new(
                    (t * 1.37).sin() * 6.0,
                    (t * 0.71).cos() * 6.0,
                    (t * 0.23).sin() * 6.0,
                    1.0 + (i % 4) as f32 * 0.3,
                )
            })
            .collect();
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        for i in 0..atoms.len() {
            let expected: Vec<usize> = (0..atoms.len())
                .filter(|&j| j != i && set.overlaps(i, j))
                .collect();
            assert_eq!(set.overlapping(i), expected, "neighbors of atom {i}");
        }
    }

    #[test]
    fn test_touching_spheres_do_not_overlap() {
        // Extended radii 2.5 + 2.5 == distance 5
        let atoms = [Atom::new(0.0, 0.0, 0.0, 1.0), Atom::new(5.0, 0.0, 0.0, 1.0)];
        let set = AtomSet::new(&atoms, 1.5).unwrap();
        assert!(!set.overlaps(0, 1));
        assert!(set.overlapping(0).is_empty());
    }

    #[test]
    fn test_filter_construction() {
        let filter = AtomFilter::from_indices([0, 2], 4).unwrap();
        assert!(filter.contains(0));
        assert!(!filter.contains(1));
        assert!(filter.contains(2));
        assert!(!filter.contains(7));
        assert_eq!(filter.count(), 2);

        let filter = AtomFilter::excluding([1], 3).unwrap();
        assert_eq!(filter.mask(), &[true, false, true]);

        assert_eq!(
            AtomFilter::from_indices([5], 3).err(),
            Some(SesError::IndexOutOfRange { index: 5, len: 3 })
        );
        assert_eq!(
            AtomFilter::from_mask(vec![true], 2).err(),
            Some(SesError::FilterLengthMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
