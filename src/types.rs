//! Surface result types.

use crate::error::Degeneracy;
use nalgebra::{Point3, Vector3};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Concave spherical patch: the probe resting on three atoms at once.
///
/// Positions 1 and 2 are swapped between the two probe placements of a triple
/// so both patches keep the same winding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpherePatch {
    pub probe_position: Point3<f32>,
    pub atom1_position: Point3<f32>,
    pub atom2_position: Point3<f32>,
    pub atom3_position: Point3<f32>,
    /// Atom indices in the same order as the positions
    pub atom_indices: [usize; 3],
}

impl SpherePatch {
    pub fn atom_positions(&self) -> [Point3<f32>; 3] {
        [self.atom1_position, self.atom2_position, self.atom3_position]
    }

    /// Whether the patch touches atom `index`.
    pub fn references(&self, index: usize) -> bool {
        self.atom_indices.contains(&index)
    }
}

/// Saddle patch swept by the probe rolling between two atoms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToroidalPatch {
    /// Center of the circle traced by the probe center
    pub torus_center: Point3<f32>,
    pub torus_radius: f32,
    /// Circle where the probe touches atom 1
    pub tangent1_center: Point3<f32>,
    pub tangent1_radius: f32,
    /// Circle where the probe touches atom 2
    pub tangent2_center: Point3<f32>,
    pub tangent2_radius: f32,
    /// Unit direction from atom 1 to atom 2
    pub axis: Vector3<f32>,
    pub atom_indices: [usize; 2],
}

impl ToroidalPatch {
    pub fn references(&self, index: usize) -> bool {
        self.atom_indices.contains(&index)
    }
}

/// Number of elements skipped per degeneracy kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub coincident_centers: usize,
    pub parallel_planes: usize,
    pub negative_radicands: usize,
    pub collinear_triples: usize,
}

impl Diagnostics {
    pub fn record(&mut self, degeneracy: Degeneracy) {
        match degeneracy {
            Degeneracy::CoincidentCenters => self.coincident_centers += 1,
            Degeneracy::ParallelPlanes => self.parallel_planes += 1,
            Degeneracy::NegativeRadicand => self.negative_radicands += 1,
            Degeneracy::CollinearTriple => self.collinear_triples += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.coincident_centers
            + self.parallel_planes
            + self.negative_radicands
            + self.collinear_triples
    }
}

impl AddAssign for Diagnostics {
    fn add_assign(&mut self, rhs: Diagnostics) {
        self.coincident_centers += rhs.coincident_centers;
        self.parallel_planes += rhs.parallel_planes;
        self.negative_radicands += rhs.negative_radicands;
        self.collinear_triples += rhs.collinear_triples;
    }
}

impl Add for Diagnostics {
    type Output = Diagnostics;
    fn add(mut self, rhs: Diagnostics) -> Diagnostics {
        self += rhs;
        self
    }
}

impl Sum for Diagnostics {
    fn sum<I: Iterator<Item = Diagnostics>>(iter: I) -> Self {
        iter.fold(Diagnostics::default(), Add::add)
    }
}

/// Per-atom surface flags, one entry per atom of the input set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceAtoms {
    pub mask: Vec<bool>,
    pub diagnostics: Diagnostics,
}

impl SurfaceAtoms {
    pub fn is_surface(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    /// Indices of surface atoms in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &surface)| surface.then_some(i))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&surface| surface).count()
    }
}

/// Patches produced by one enumeration together with its skip counters.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchList<T> {
    pub patches: Vec<T>,
    pub diagnostics: Diagnostics,
}

impl<T> PatchList<T> {
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.patches.iter()
    }
}

impl<T> Default for PatchList<T> {
    fn default() -> Self {
        Self {
            patches: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }
}

/// Everything computed for one atom set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SesSurface {
    pub surface_atoms: SurfaceAtoms,
    pub sphere_patches: PatchList<SpherePatch>,
    pub toroidal_patches: PatchList<ToroidalPatch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_sum() {
        let mut a = Diagnostics::default();
        a.record(Degeneracy::CoincidentCenters);
        a.record(Degeneracy::NegativeRadicand);
        let mut b = Diagnostics::default();
        b.record(Degeneracy::NegativeRadicand);
        b.record(Degeneracy::ParallelPlanes);

        let total: Diagnostics = [a, b].into_iter().sum();
        assert_eq!(total.coincident_centers, 1);
        assert_eq!(total.negative_radicands, 2);
        assert_eq!(total.parallel_planes, 1);
        assert_eq!(total.collinear_triples, 0);
        assert_eq!(total.total(), 4);
    }

    #[test]
    fn test_surface_indices() {
        let surface = SurfaceAtoms {
            mask: vec![true, false, true, false],
            diagnostics: Diagnostics::default(),
        };
        assert_eq!(surface.indices(), vec![0, 2]);
        assert_eq!(surface.count(), 2);
        assert!(!surface.is_surface(10));
    }
}
