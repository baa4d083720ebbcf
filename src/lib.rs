#![doc = include_str!("../README.md")]

//! # Sesurf Library
//!
//! The geometric core works on plain [`Atom`] slices and returns typed
//! results. The structure-level helpers below load atoms from PDB or mmCIF
//! files with `pdbtbx` and turn results into Polars DataFrames.

mod atoms;
mod calculator;
mod cancel;
mod cutting_faces;
mod error;
mod geometry;
mod patches;
mod settings;
mod types;
mod utils;

// Re-export key public types
pub use atoms::{Atom, AtomFilter, AtomSet};
pub use calculator::SesCalculator;
pub use cancel::CancellationToken;
pub use cutting_faces::{cutting_faces, is_surface_atom, surface_atoms, CuttingFace};
pub use error::{Degeneracy, SesError};
pub use geometry::{
    guarded_sqrt, intersect_planes, line_sphere_discriminant, line_sphere_intersection,
    perpendicular, radical_plane, Line, LineSphereIntersection, Plane,
};
pub use patches::{spherical_contact_patches, toroidal_saddle_patches};
pub use settings::Settings;
pub use types::{Diagnostics, PatchList, SesSurface, SpherePatch, SurfaceAtoms, ToroidalPatch};
pub use utils::{
    atoms_from_pdb, filter_by_serials, load_model, resolve_model, run_with_threads,
    write_df_to_file, AtomRecord, DataFrameFileType,
};

use pdbtbx::PDB;
use polars::prelude::*;
use tracing::debug;

/// Compute the surface atoms and SES patches of one model in a structure.
///
/// # Arguments
///
/// * `pdb` - Reference to a PDB structure
/// * `model_num` - Model number to analyze (0 for first model)
/// * `keep_hydrogens` - Include hydrogen atoms
/// * `settings` - Probe radius and numerical tolerances
/// * `serials` - Restrict the computation to these atom serial numbers
///
/// # Returns
///
/// The annotations of the extracted atoms, aligned with the indices used by
/// the surface results, and the computed [`SesSurface`].
///
/// # Example
///
/// ```no_run
/// use sesurf::{load_model, get_surface, Settings};
///
/// let (pdb, _errors) = load_model("path/to/structure.pdb").unwrap();
/// let (_records, surface) = get_surface(&pdb, 0, false, &Settings::default(), None).unwrap();
/// println!("Found {} surface atoms", surface.surface_atoms.count());
/// ```
pub fn get_surface(
    pdb: &PDB,
    model_num: usize,
    keep_hydrogens: bool,
    settings: &Settings,
    serials: Option<&[usize]>,
) -> Result<(Vec<AtomRecord>, SesSurface), SesError> {
    let (atoms, records) = atoms_from_pdb(pdb, model_num, keep_hydrogens)?;
    let filter = serials
        .map(|s| filter_by_serials(&records, s))
        .transpose()?;
    if let Some(f) = &filter {
        debug!(
            "Restricting the computation to {} of {} atoms",
            f.count(),
            atoms.len()
        );
    }

    let surface =
        SesCalculator::with_settings(settings.clone()).compute(&atoms, filter.as_ref())?;
    Ok((records, surface))
}

/// Per-atom surface flags with the atom annotations.
///
/// # Returns
///
/// A Polars DataFrame with columns:
/// - model, chain, resn, resi, insertion, altloc, atomn, atomi
/// - surface
pub fn surface_atoms_to_df(
    records: &[AtomRecord],
    surface: &SurfaceAtoms,
) -> PolarsResult<DataFrame> {
    df!(
        "model" => records.iter().map(|x| x.model as u32).collect::<Vec<u32>>(),
        "chain" => records.iter().map(|x| x.chain.to_owned()).collect::<Vec<String>>(),
        "resn" => records.iter().map(|x| x.resn.to_owned()).collect::<Vec<String>>(),
        "resi" => records.iter().map(|x| x.resi as i32).collect::<Vec<i32>>(),
        "insertion" => records.iter().map(|x| x.insertion.to_owned()).collect::<Vec<String>>(),
        "altloc" => records.iter().map(|x| x.altloc.to_owned()).collect::<Vec<String>>(),
        "atomn" => records.iter().map(|x| x.atomn.to_owned()).collect::<Vec<String>>(),
        "atomi" => records.iter().map(|x| x.atomi as i32).collect::<Vec<i32>>(),
        "surface" => (0..records.len()).map(|i| surface.is_surface(i)).collect::<Vec<bool>>(),
    )
}

/// One row per concave spherical patch.
///
/// # Returns
///
/// A Polars DataFrame with columns:
/// - probe_x, probe_y, probe_z
/// - atomi_1, atomi_2, atomi_3 in patch winding order
///
/// `records` must be the annotations the patches were computed from.
pub fn sphere_patches_to_df(
    records: &[AtomRecord],
    patches: &PatchList<SpherePatch>,
) -> PolarsResult<DataFrame> {
    df!(
        "probe_x" => patch_column(patches, |p| p.probe_position.x),
        "probe_y" => patch_column(patches, |p| p.probe_position.y),
        "probe_z" => patch_column(patches, |p| p.probe_position.z),
        "atomi_1" => serial_column(records, patches, |p| p.atom_indices[0]),
        "atomi_2" => serial_column(records, patches, |p| p.atom_indices[1]),
        "atomi_3" => serial_column(records, patches, |p| p.atom_indices[2]),
    )
}

/// One row per toroidal saddle patch.
///
/// # Returns
///
/// A Polars DataFrame with columns:
/// - atomi_1, atomi_2
/// - torus_x, torus_y, torus_z, torus_radius
/// - axis_x, axis_y, axis_z
/// - tangent1_x, tangent1_y, tangent1_z, tangent1_radius
/// - tangent2_x, tangent2_y, tangent2_z, tangent2_radius
pub fn toroidal_patches_to_df(
    records: &[AtomRecord],
    patches: &PatchList<ToroidalPatch>,
) -> PolarsResult<DataFrame> {
    df!(
        "atomi_1" => serial_column(records, patches, |p| p.atom_indices[0]),
        "atomi_2" => serial_column(records, patches, |p| p.atom_indices[1]),
        "torus_x" => patch_column(patches, |p| p.torus_center.x),
        "torus_y" => patch_column(patches, |p| p.torus_center.y),
        "torus_z" => patch_column(patches, |p| p.torus_center.z),
        "torus_radius" => patch_column(patches, |p| p.torus_radius),
        "axis_x" => patch_column(patches, |p| p.axis.x),
        "axis_y" => patch_column(patches, |p| p.axis.y),
        "axis_z" => patch_column(patches, |p| p.axis.z),
        "tangent1_x" => patch_column(patches, |p| p.tangent1_center.x),
        "tangent1_y" => patch_column(patches, |p| p.tangent1_center.y),
        "tangent1_z" => patch_column(patches, |p| p.tangent1_center.z),
        "tangent1_radius" => patch_column(patches, |p| p.tangent1_radius),
        "tangent2_x" => patch_column(patches, |p| p.tangent2_center.x),
        "tangent2_y" => patch_column(patches, |p| p.tangent2_center.y),
        "tangent2_z" => patch_column(patches, |p| p.tangent2_center.z),
        "tangent2_radius" => patch_column(patches, |p| p.tangent2_radius),
    )
}

// Helper functions (kept private)

fn patch_column<T>(patches: &PatchList<T>, value: impl Fn(&T) -> f32) -> Vec<f32> {
    patches.iter().map(value).collect()
}

/// Serial numbers of the atom picked by `index` from each patch.
fn serial_column<T>(
    records: &[AtomRecord],
    patches: &PatchList<T>,
    index: impl Fn(&T) -> usize,
) -> Vec<i32> {
    patches
        .iter()
        .map(|p| records[index(p)].atomi as i32)
        .collect()
}
