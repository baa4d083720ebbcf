//! Surface-atom classification with cutting faces.
//!
//! Every neighbor whose extended sphere overlaps the extended sphere of atom
//! `i` cuts a spherical cap off it along their radical plane. The atom is
//! buried when the caps cover its whole extended sphere. Coverage is decided
//! from the points where two cut circles meet: if one of them is left
//! outside every other cap, part of the sphere is still reachable by the
//! probe.

use crate::atoms::{admits, AtomFilter, AtomSet};
use crate::cancel::{self, CancellationToken};
use crate::error::SesError;
use crate::geometry::{
    intersect_planes, line_sphere_discriminant, line_sphere_intersection, radical_plane, Plane,
};
use crate::settings::Settings;
use crate::types::{Diagnostics, SurfaceAtoms};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Radical plane between an atom and one overlapping neighbor.
#[derive(Clone, Debug, PartialEq)]
pub struct CuttingFace {
    pub center: Point3<f32>,
    /// Unit normal pointing towards the neighbor, i.e. into the removed cap
    pub normal: Vector3<f32>,
    /// Index of the atom that induced the face
    pub neighbor: usize,
    /// Cleared when the face's cap lies inside another face's cap
    pub alive: bool,
}

impl CuttingFace {
    fn plane(&self) -> Plane {
        Plane {
            center: self.center,
            normal: self.normal,
        }
    }

    /// Whether `point` is left on the kept side of this face.
    fn keeps(&self, point: &Point3<f32>, epsilon: f32) -> bool {
        (point - (self.center + self.normal * epsilon)).dot(&self.normal) <= 0.0
    }

    /// Whether this face's cap is contained in `other`'s cap.
    ///
    /// Only meaningful when the two planes do not meet inside the sphere: the
    /// cap is swallowed when its center lies beyond `other` while `other`'s
    /// center stays on the kept side of this face.
    fn is_dominated_by(&self, other: &CuttingFace) -> bool {
        (self.center - other.center).dot(&other.normal) > 0.0
            && (other.center - self.center).dot(&self.normal) < 0.0
    }
}

/// Cutting faces of atom `index`, one per overlapping neighbor.
///
/// Neighbors sharing the atom's center produce no face.
pub fn cutting_faces(atoms: &AtomSet, index: usize) -> Result<Vec<CuttingFace>, SesError> {
    atoms.check_index(index)?;
    Ok(build_faces(atoms, index, &mut Diagnostics::default()))
}

fn build_faces(
    atoms: &AtomSet,
    index: usize,
    diagnostics: &mut Diagnostics,
) -> Vec<CuttingFace> {
    let center = atoms.center(index);
    let radius = atoms.extended_radius(index);
    atoms
        .overlapping(index)
        .into_iter()
        .filter_map(|j| {
            match radical_plane(&center, radius, &atoms.center(j), atoms.extended_radius(j)) {
                Ok(plane) => Some(CuttingFace {
                    center: plane.center,
                    normal: plane.normal,
                    neighbor: j,
                    alive: true,
                }),
                Err(e) => {
                    trace!("Atom {index}: no cutting face from atom {j}: {e}");
                    diagnostics.record(e);
                    None
                }
            }
        })
        .collect()
}

/// Whether any part of the extended sphere of atom `index` is reachable by
/// the probe.
pub fn is_surface_atom(
    atoms: &AtomSet,
    index: usize,
    settings: &Settings,
) -> Result<bool, SesError> {
    atoms.check_index(index)?;
    Ok(classify(atoms, index, settings, &mut Diagnostics::default()))
}

fn classify(
    atoms: &AtomSet,
    index: usize,
    settings: &Settings,
    diagnostics: &mut Diagnostics,
) -> bool {
    let mut faces = build_faces(atoms, index, diagnostics);
    if faces.is_empty() {
        return true;
    }
    let center = atoms.center(index);
    let radius = atoms.extended_radius(index);

    // Retire faces whose cap is swallowed by another cap
    for a in 0..faces.len() {
        for b in (a + 1)..faces.len() {
            let tolerance = settings.parallel_tolerance;
            let line = match intersect_planes(&faces[a].plane(), &faces[b].plane(), tolerance) {
                Ok(line) => line,
                Err(e) => {
                    diagnostics.record(e);
                    continue;
                }
            };
            if line_sphere_discriminant(&line, &center, radius) >= 0.0 {
                continue;
            }
            if faces[a].is_dominated_by(&faces[b]) {
                faces[a].alive = false;
            } else if faces[b].is_dominated_by(&faces[a]) {
                faces[b].alive = false;
            }
        }
    }

    let alive: Vec<&CuttingFace> = faces.iter().filter(|f| f.alive).collect();
    let mut found_endpoint = false;
    for (a, f) in alive.iter().enumerate() {
        for g in &alive[a + 1..] {
            let tolerance = settings.parallel_tolerance;
            let Ok(line) = intersect_planes(&f.plane(), &g.plane(), tolerance) else {
                continue;
            };
            for endpoint in line_sphere_intersection(&line, &center, radius).points() {
                found_endpoint = true;
                if alive.iter().all(|h| h.keeps(&endpoint, settings.face_epsilon)) {
                    return true;
                }
            }
        }
    }

    // Without any endpoint the caps never meet and cannot cover the sphere
    !found_endpoint
}

/// Classify every atom admitted by `filter`.
///
/// Faces are induced by all atoms of the set, so the flag of an admitted atom
/// does not depend on the filter. Atoms outside the filter are reported as
/// not surface.
pub fn surface_atoms(
    atoms: &AtomSet,
    filter: Option<&AtomFilter>,
    settings: &Settings,
    cancel: Option<&CancellationToken>,
) -> Result<SurfaceAtoms, SesError> {
    if let Some(f) = filter {
        f.check_len(atoms.len())?;
    }

    let results: Result<Vec<(bool, Diagnostics)>, SesError> = (0..atoms.len())
        .into_par_iter()
        .map(|i| {
            cancel::check(cancel)?;
            let mut diagnostics = Diagnostics::default();
            if !admits(filter, i) {
                return Ok((false, diagnostics));
            }
            let surface = classify(atoms, i, settings, &mut diagnostics);
            Ok((surface, diagnostics))
        })
        .collect();

    let (mask, diagnostics): (Vec<bool>, Vec<Diagnostics>) = results?.into_iter().unzip();
    let surface = SurfaceAtoms {
        mask,
        diagnostics: diagnostics.into_iter().sum(),
    };
    debug!(
        "Classified {} of {} atoms as surface; skipped {:?}",
        surface.count(),
        atoms.len(),
        surface.diagnostics
    );
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Atom;

    fn octahedral_cage(distance: f32) -> Vec<Atom> {
        let mut atoms = vec![Atom::new(0.0, 0.0, 0.0, 2.0)];
        for (x, y, z) in [
            (1.0, 0.0, 0.0),
            (-1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, -1.0, 0.0),
            (0.0, 0.0, 1.0),
            (0.0, 0.0, -1.0),
        ] {
            atoms.push(Atom::new(x * distance, y * distance, z * distance, 2.0));
        }
        atoms
    }

    fn tetrahedral_cage(distance: f32) -> Vec<Atom> {
        let s = distance / 3.0_f32.sqrt();
        let mut atoms = vec![Atom::new(0.0, 0.0, 0.0, 2.0)];
        for (x, y, z) in [
            (1.0, 1.0, 1.0),
            (1.0, -1.0, -1.0),
            (-1.0, 1.0, -1.0),
            (-1.0, -1.0, 1.0),
        ] {
            atoms.push(Atom::new(x * s, y * s, z * s, 2.0));
        }
        atoms
    }

    fn without(atoms: &[Atom], index: usize) -> Vec<Atom> {
        atoms
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, a)| *a)
            .collect()
    }

    fn central_is_surface(atoms: &[Atom]) -> bool {
        let set = AtomSet::new(atoms, 1.4).unwrap();
        is_surface_atom(&set, 0, &Settings::with_probe_radius(1.4)).unwrap()
    }

    #[test]
    fn test_isolated_atom() {
        let atoms = [Atom::new(0.0, 0.0, 0.0, 1.5), Atom::new(20.0, 0.0, 0.0, 1.5)];
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        assert!(cutting_faces(&set, 0).unwrap().is_empty());
        assert!(is_surface_atom(&set, 0, &Settings::default()).unwrap());
    }

    #[test]
    fn test_single_atom() {
        let atoms = [Atom::new(3.0, -1.0, 2.0, 1.8)];
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        let surface = surface_atoms(&set, None, &Settings::default(), None).unwrap();
        assert_eq!(surface.mask, vec![true]);
        assert_eq!(surface.diagnostics, Diagnostics::default());
    }

    #[test]
    fn test_two_atoms() {
        let atoms = [Atom::new(0.0, 0.0, 0.0, 1.0), Atom::new(2.5, 0.0, 0.0, 1.0)];
        let set = AtomSet::new(&atoms, 1.3).unwrap();

        let faces = cutting_faces(&set, 0).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].neighbor, 1);
        assert!((faces[0].center.x - 1.25).abs() < 1e-5);
        assert!((faces[0].normal.x - 1.0).abs() < 1e-5);

        let surface = surface_atoms(&set, None, &Settings::with_probe_radius(1.3), None).unwrap();
        assert_eq!(surface.mask, vec![true, true]);
    }

    #[test]
    fn test_octahedral_cage_buries_center() {
        let atoms = octahedral_cage(3.0);
        assert!(!central_is_surface(&atoms));
        for removed in 1..atoms.len() {
            assert!(
                central_is_surface(&without(&atoms, removed)),
                "removing atom {removed} should expose the center"
            );
        }
    }

    #[test]
    fn test_tetrahedral_cage_buries_center() {
        // At distance 2 every cap spans ~73 degrees, enough to cover the
        // ~70.5 degree gaps of a tetrahedral arrangement
        let atoms = tetrahedral_cage(2.0);
        assert!(!central_is_surface(&atoms));
        for removed in 1..atoms.len() {
            assert!(
                central_is_surface(&without(&atoms, removed)),
                "removing atom {removed} should expose the center"
            );
        }
    }

    #[test]
    fn test_loose_tetrahedral_cage_leaves_gaps() {
        // At distance 3 the caps span ~64 degrees and do not meet over the
        // faces of the tetrahedron
        assert!(central_is_surface(&tetrahedral_cage(3.0)));
    }

    #[test]
    fn test_cage_batch() {
        let atoms = octahedral_cage(3.0);
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        let surface = surface_atoms(&set, None, &Settings::default(), None).unwrap();
        assert_eq!(surface.indices(), vec![1, 2, 3, 4, 5, 6]);
        for i in 0..atoms.len() {
            assert_eq!(cutting_faces(&set, i).unwrap().len(), 6);
        }
    }

    #[test]
    fn test_coincident_centers_are_skipped() {
        let atoms = [
            Atom::new(1.0, 1.0, 1.0, 1.5),
            Atom::new(1.0, 1.0, 1.0, 1.5),
            Atom::new(3.0, 1.0, 1.0, 1.5),
        ];
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        let faces = cutting_faces(&set, 0).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].neighbor, 2);

        let surface = surface_atoms(&set, None, &Settings::default(), None).unwrap();
        assert_eq!(surface.mask, vec![true, true, true]);
        // Atoms 0 and 1 each see the other as coincident
        assert_eq!(surface.diagnostics.coincident_centers, 2);
    }

    #[test]
    fn test_enclosed_atom_stays_surface() {
        // A lone enclosing neighbor builds a single face, which never covers
        // the sphere on its own
        let atoms = [Atom::new(0.0, 0.0, 0.0, 0.5), Atom::new(0.5, 0.0, 0.0, 3.0)];
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        assert_eq!(cutting_faces(&set, 0).unwrap().len(), 1);
        assert!(is_surface_atom(&set, 0, &Settings::default()).unwrap());
    }

    #[test]
    fn test_filter_keeps_classification_of_retained_atoms() {
        let atoms = octahedral_cage(3.0);
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        let settings = Settings::default();
        let full = surface_atoms(&set, None, &settings, None).unwrap();

        let filter = AtomFilter::from_indices([0, 3, 5], atoms.len()).unwrap();
        let filtered = surface_atoms(&set, Some(&filter), &settings, None).unwrap();
        for i in 0..atoms.len() {
            if filter.contains(i) {
                assert_eq!(filtered.mask[i], full.mask[i], "atom {i}");
            } else {
                assert!(!filtered.mask[i]);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let atoms: Vec<Atom> = (0..30)
            .map(|i| {
                let t = i as f32;
                Atom::new(
                    (t * 0.9).sin() * 4.0,
                    (t * 1.3).cos() * 4.0,
                    (t * 0.4).sin() * 4.0,
                    1.6,
                )
            })
            .collect();
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        let settings = Settings::default();
        let first = surface_atoms(&set, None, &settings, None).unwrap();
        let second = surface_atoms(&set, None, &settings, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_index_and_filter() {
        let atoms = [Atom::new(0.0, 0.0, 0.0, 1.5)];
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        assert_eq!(
            is_surface_atom(&set, 3, &Settings::default()).err(),
            Some(SesError::IndexOutOfRange { index: 3, len: 1 })
        );
        let filter = AtomFilter::from_indices([0], 2).unwrap();
        assert_eq!(
            surface_atoms(&set, Some(&filter), &Settings::default(), None).err(),
            Some(SesError::FilterLengthMismatch {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_cancelled() {
        let atoms = octahedral_cage(3.0);
        let set = AtomSet::new(&atoms, 1.4).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            surface_atoms(&set, None, &Settings::default(), Some(&token)).err(),
            Some(SesError::Cancelled)
        );
    }
}
