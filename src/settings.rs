//! Surface calculation settings.

/// Radius of a water molecule, the usual solvent probe
pub const PROBE_RADIUS: f32 = 1.4;
/// Offset applied along a face normal before testing an endpoint against it
pub const FACE_EPSILON: f32 = 1e-3;
/// Normals whose |dot| exceeds this are treated as parallel
pub const PARALLEL_TOLERANCE: f32 = 1.0 - 1e-6;
/// Negative square-root arguments down to -epsilon are taken as rounding noise
pub const RADICAND_EPSILON: f32 = 1e-4;
/// Minimum off-axis distance of the third atom of a triple
pub const COLLINEAR_TOLERANCE: f32 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Solvent probe radius in Å
    pub probe_radius: f32,
    /// Endpoint offset used by the cutting-face survival test in Å
    pub face_epsilon: f32,
    /// |dot| threshold above which two plane normals count as parallel
    pub parallel_tolerance: f32,
    /// Tolerated negative noise under a square root in Å²
    pub radicand_epsilon: f32,
    /// Minimum Gram-Schmidt residual when building a triple frame in Å
    pub collinear_tolerance: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            probe_radius: PROBE_RADIUS,
            face_epsilon: FACE_EPSILON,
            parallel_tolerance: PARALLEL_TOLERANCE,
            radicand_epsilon: RADICAND_EPSILON,
            collinear_tolerance: COLLINEAR_TOLERANCE,
        }
    }
}

impl Settings {
    /// Default tolerances with a custom probe radius.
    pub fn with_probe_radius(probe_radius: f32) -> Self {
        Self {
            probe_radius,
            ..Self::default()
        }
    }
}
