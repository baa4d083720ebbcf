//! Enumeration of the analytic SES patches.
//!
//! Concave spherical patches come from atom triples the probe can touch at
//! once; saddle patches come from overlapping atom pairs the probe rolls
//! between. Pairs and triples are drawn from the overlapping-neighbor lists in
//! ascending index order, and each is computed independently of all others.

use crate::atoms::{admits, AtomFilter, AtomSet};
use crate::cancel::{self, CancellationToken};
use crate::error::{Degeneracy, SesError};
use crate::geometry::{guarded_sqrt, perpendicular, radical_plane, COINCIDENT_DISTANCE_SQ};
use crate::settings::Settings;
use crate::types::{Diagnostics, PatchList, SpherePatch, ToroidalPatch};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Patches and skip counters of each outer atom, in atom order
type PerAtom<T> = Result<Vec<(Vec<T>, Diagnostics)>, SesError>;

/// Whether three side lengths form a non-degenerate triangle.
fn satisfies_triangle_inequality(a: f32, b: f32, c: f32) -> bool {
    a + b > c && a + c > b && b + c > a
}

/// The two probe placements touching the extended spheres of `i`, `j`, `k`.
///
/// Works in the frame `x = i->j`, `y` = component of `i->k` orthogonal to
/// `x`, `z = x × y`. The probe center lies on the circle where the spheres of
/// `i` and `j` meet, at the height `±z` where that circle crosses the sphere
/// of `k`.
fn contact_probes(
    atoms: &AtomSet,
    [i, j, k]: [usize; 3],
    settings: &Settings,
) -> Result<[SpherePatch; 2], Degeneracy> {
    let (pi, pj, pk) = (atoms.center(i), atoms.center(j), atoms.center(k));
    let (ri, rj, rk) = (
        atoms.extended_radius(i),
        atoms.extended_radius(j),
        atoms.extended_radius(k),
    );

    let ij = pj - pi;
    let ik = pk - pi;
    let d_ij = ij.norm();
    let d_ik = ik.norm();
    let d_jk = (pk - pj).norm();
    if d_ij * d_ij <= COINCIDENT_DISTANCE_SQ || d_ik * d_ik <= COINCIDENT_DISTANCE_SQ {
        return Err(Degeneracy::CoincidentCenters);
    }
    if !satisfies_triangle_inequality(d_ij, d_ik, d_jk) {
        return Err(Degeneracy::CollinearTriple);
    }

    let omega_x = ij / d_ij;
    let omega_y = (ik - omega_x * ik.dot(&omega_x))
        .try_normalize(settings.collinear_tolerance)
        .ok_or(Degeneracy::CollinearTriple)?;
    let omega_z = omega_x.cross(&omega_y);

    let x = (d_ij * d_ij + ri * ri - rj * rj) / (2.0 * d_ij);
    let ring_radius = guarded_sqrt(ri * ri - x * x, settings.radicand_epsilon)?;

    let k_x = ik.dot(&omega_x);
    let k_y = ik.dot(&omega_y);
    let y = (ri * ri - rk * rk + k_x * k_x + k_y * k_y - 2.0 * x * k_x) / (2.0 * k_y);
    let z = guarded_sqrt(ring_radius * ring_radius - y * y, settings.radicand_epsilon)?;

    let base = pi + omega_x * x + omega_y * y;
    Ok([
        SpherePatch {
            probe_position: base + omega_z * z,
            atom1_position: pi,
            atom2_position: pj,
            atom3_position: pk,
            atom_indices: [i, j, k],
        },
        SpherePatch {
            probe_position: base - omega_z * z,
            atom1_position: pj,
            atom2_position: pi,
            atom3_position: pk,
            atom_indices: [j, i, k],
        },
    ])
}

/// Saddle patch between the overlapping atoms `i` and `j`.
///
/// The probe center circles the axis at the radical-plane center; the
/// tangent circles are where the probe touches the van der Waals spheres,
/// derived from one probe rest position on the circle.
fn saddle(
    atoms: &AtomSet,
    i: usize,
    j: usize,
    settings: &Settings,
) -> Result<ToroidalPatch, Degeneracy> {
    let (pi, pj) = (atoms.center(i), atoms.center(j));
    let (ri, rj) = (atoms.extended_radius(i), atoms.extended_radius(j));
    let plane = radical_plane(&pi, ri, &pj, rj)?;
    let axis = plane.normal;

    let x = (plane.center - pi).dot(&axis);
    let torus_radius = guarded_sqrt(ri * ri - x * x, settings.radicand_epsilon)?;

    let probe = plane.center + perpendicular(&axis) * torus_radius;
    let touch_i = pi + (probe - pi) * (atoms.radius(i) / ri);
    let touch_j = pj + (probe - pj) * (atoms.radius(j) / rj);
    let tangent1_center = pi + axis * (touch_i - pi).dot(&axis);
    let tangent2_center = pj + axis * (touch_j - pj).dot(&axis);

    Ok(ToroidalPatch {
        torus_center: plane.center,
        torus_radius,
        tangent1_center,
        tangent1_radius: (touch_i - tangent1_center).norm(),
        tangent2_center,
        tangent2_radius: (touch_j - tangent2_center).norm(),
        axis,
        atom_indices: [i, j],
    })
}

/// Spherical contact patches for every admitted triple of mutually
/// overlapping atoms, two per triple.
///
/// A triple is skipped when any member is outside `filter`. Triples without a
/// probe placement are counted in the returned diagnostics.
pub fn spherical_contact_patches(
    atoms: &AtomSet,
    filter: Option<&AtomFilter>,
    settings: &Settings,
    cancel: Option<&CancellationToken>,
) -> Result<PatchList<SpherePatch>, SesError> {
    if let Some(f) = filter {
        f.check_len(atoms.len())?;
    }

    let results: PerAtom<SpherePatch> = (0..atoms.len())
        .into_par_iter()
        .map(|i| {
            cancel::check(cancel)?;
            let mut patches = Vec::new();
            let mut diagnostics = Diagnostics::default();
            if !admits(filter, i) {
                return Ok((patches, diagnostics));
            }
            let neighbors = atoms.overlapping(i);
            for (a, &j) in neighbors.iter().enumerate() {
                if j < i || !admits(filter, j) {
                    continue;
                }
                for &k in &neighbors[a + 1..] {
                    if !admits(filter, k) || !atoms.overlaps(j, k) {
                        continue;
                    }
                    match contact_probes(atoms, [i, j, k], settings) {
                        Ok(pair) => patches.extend(pair),
                        Err(e) => {
                            trace!("No contact patch for atoms ({i}, {j}, {k}): {e}");
                            diagnostics.record(e);
                        }
                    }
                }
            }
            Ok((patches, diagnostics))
        })
        .collect();

    let list = merge(results?);
    debug!(
        "Found {} spherical contact patches; skipped {:?}",
        list.len(),
        list.diagnostics
    );
    Ok(list)
}

/// Toroidal saddle patches for every admitted pair of overlapping atoms.
///
/// A pair is skipped when either member is outside `filter`.
pub fn toroidal_saddle_patches(
    atoms: &AtomSet,
    filter: Option<&AtomFilter>,
    settings: &Settings,
    cancel: Option<&CancellationToken>,
) -> Result<PatchList<ToroidalPatch>, SesError> {
    if let Some(f) = filter {
        f.check_len(atoms.len())?;
    }

    let results: PerAtom<ToroidalPatch> = (0..atoms.len())
        .into_par_iter()
        .map(|i| {
            cancel::check(cancel)?;
            let mut patches = Vec::new();
            let mut diagnostics = Diagnostics::default();
            if !admits(filter, i) {
                return Ok((patches, diagnostics));
            }
            for j in atoms.overlapping(i) {
                if j < i || !admits(filter, j) {
                    continue;
                }
                match saddle(atoms, i, j, settings) {
                    Ok(patch) => patches.push(patch),
                    Err(e) => {
                        trace!("No saddle patch for atoms ({i}, {j}): {e}");
                        diagnostics.record(e);
                    }
                }
            }
            Ok((patches, diagnostics))
        })
        .collect();

    let list = merge(results?);
    debug!(
        "Found {} toroidal saddle patches; skipped {:?}",
        list.len(),
        list.diagnostics
    );
    Ok(list)
}

fn merge<T>(per_atom: Vec<(Vec<T>, Diagnostics)>) -> PatchList<T> {
    let mut list = PatchList::default();
    for (mut patches, diagnostics) in per_atom {
        list.patches.append(&mut patches);
        list.diagnostics += diagnostics;
    }
    list
}
