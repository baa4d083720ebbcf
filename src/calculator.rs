//! Entry point bundling settings and cancellation for all surface computations.

use crate::atoms::{Atom, AtomFilter, AtomSet};
use crate::cancel::CancellationToken;
use crate::cutting_faces;
use crate::error::SesError;
use crate::patches;
use crate::settings::Settings;
use crate::types::{PatchList, SesSurface, SpherePatch, SurfaceAtoms, ToroidalPatch};
use tracing::{debug, info};

/// Runs the classifier and the patch enumerators with shared settings.
///
/// ```
/// use sesurf::{Atom, SesCalculator};
///
/// let atoms = [Atom::new(0.0, 0.0, 0.0, 1.0), Atom::new(2.5, 0.0, 0.0, 1.0)];
/// let surface = SesCalculator::new().compute(&atoms, None).unwrap();
/// assert_eq!(surface.toroidal_patches.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SesCalculator {
    pub settings: Settings,
    cancel: Option<CancellationToken>,
}

impl SesCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            cancel: None,
        }
    }

    /// Poll `token` during every computation started by this calculator.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate `atoms` and build their neighbor index.
    pub fn atom_set<'a>(&self, atoms: &'a [Atom]) -> Result<AtomSet<'a>, SesError> {
        AtomSet::new(atoms, self.settings.probe_radius)
    }

    pub fn surface_atoms(
        &self,
        atoms: &[Atom],
        filter: Option<&AtomFilter>,
    ) -> Result<SurfaceAtoms, SesError> {
        let set = self.atom_set(atoms)?;
        cutting_faces::surface_atoms(&set, filter, &self.settings, self.cancel.as_ref())
    }

    pub fn contact_patches(
        &self,
        atoms: &[Atom],
        filter: Option<&AtomFilter>,
    ) -> Result<PatchList<SpherePatch>, SesError> {
        let set = self.atom_set(atoms)?;
        patches::spherical_contact_patches(&set, filter, &self.settings, self.cancel.as_ref())
    }

    pub fn saddle_patches(
        &self,
        atoms: &[Atom],
        filter: Option<&AtomFilter>,
    ) -> Result<PatchList<ToroidalPatch>, SesError> {
        let set = self.atom_set(atoms)?;
        patches::toroidal_saddle_patches(&set, filter, &self.settings, self.cancel.as_ref())
    }

    /// Classify surface atoms and enumerate both patch kinds.
    ///
    /// The three computations share one neighbor index and run concurrently.
    pub fn compute(
        &self,
        atoms: &[Atom],
        filter: Option<&AtomFilter>,
    ) -> Result<SesSurface, SesError> {
        let set = self.atom_set(atoms)?;
        debug!(
            "Computing surface of {} atoms with probe radius {}",
            set.len(),
            set.probe_radius()
        );
        let cancel = self.cancel.as_ref();

        let (surface_atoms, (sphere_patches, toroidal_patches)) = rayon::join(
            || cutting_faces::surface_atoms(&set, filter, &self.settings, cancel),
            || {
                rayon::join(
                    || patches::spherical_contact_patches(&set, filter, &self.settings, cancel),
                    || patches::toroidal_saddle_patches(&set, filter, &self.settings, cancel),
                )
            },
        );
        let surface = SesSurface {
            surface_atoms: surface_atoms?,
            sphere_patches: sphere_patches?,
            toroidal_patches: toroidal_patches?,
        };

        info!(
            "Found {} surface atoms, {} spherical and {} toroidal patches",
            surface.surface_atoms.count(),
            surface.sphere_patches.len(),
            surface.toroidal_patches.len()
        );
        Ok(surface)
    }
}
