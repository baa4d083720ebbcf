//! Error types for surface computations.
//!
//! Two kinds of failure exist. [`SesError`] aborts a call: the input is
//! unusable and no partial result is returned. [`Degeneracy`] describes a
//! single atom pair or triple whose geometry has no well-defined answer; the
//! element is skipped and counted in [`Diagnostics`](crate::Diagnostics).

use thiserror::Error;

/// Errors that abort a surface computation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SesError {
    /// No atoms were supplied.
    #[error("atom set is empty")]
    EmptyAtomSet,

    /// An atom radius is zero, negative or not finite.
    #[error("atom {index} has invalid radius {radius}")]
    InvalidRadius {
        /// Position of the atom in the input slice.
        index: usize,
        /// The offending radius.
        radius: f32,
    },

    /// The probe radius is negative or not finite.
    #[error("invalid probe radius {0}")]
    InvalidProbeRadius(f32),

    /// An atom center has a NaN or infinite component.
    #[error("atom {index} has a non-finite center")]
    NonFiniteCoordinate {
        /// Position of the atom in the input slice.
        index: usize,
    },

    /// An atom index does not exist in the atom set.
    #[error("atom index {index} out of range for {len} atoms")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of atoms in the set.
        len: usize,
    },

    /// A boolean mask does not have one entry per atom.
    #[error("filter mask has {found} entries but the atom set has {expected}")]
    FilterLengthMismatch {
        /// Number of atoms in the set.
        expected: usize,
        /// Length of the supplied mask.
        found: usize,
    },

    /// The computation was stopped through its cancellation token.
    #[error("computation cancelled")]
    Cancelled,

    /// The structure file could not be turned into atoms.
    #[error("failed to load structure: {0}")]
    Load(String),
}

/// Reasons a single pair or triple produces no geometry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Degeneracy {
    /// Two atom centers coincide, so no direction between them exists.
    #[error("coincident atom centers")]
    CoincidentCenters,

    /// Two planes are parallel and have no unique intersection line.
    #[error("parallel planes")]
    ParallelPlanes,

    /// A square-root argument is negative beyond the tolerated noise.
    #[error("negative radicand")]
    NegativeRadicand,

    /// Three atom centers are (nearly) collinear.
    #[error("collinear atom triple")]
    CollinearTriple,
}
