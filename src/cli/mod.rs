pub(crate) mod classify;
pub(crate) mod patches;

use sesurf::{get_surface, load_model, run_with_threads, AtomRecord, DataFrameFileType};
use sesurf::{SesSurface, Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, error, trace, warn};

/// Options shared by every surface subcommand.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct SurfaceArgs {
    /// Path to the PDB or mmCIF file to be analyzed
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    pub output_format: DataFrameFileType,

    /// Probe radius r (smaller r detects more surface details)
    #[arg(short = 'r', long = "probe-radius", default_value_t = 1.4)]
    pub probe_radius: f32,

    /// Model number to analyze (0 for the first model)
    #[arg(short, long, default_value_t = 0)]
    pub model: usize,

    /// Keep hydrogen atoms
    #[arg(long = "keep-hydrogens", default_value_t = false)]
    pub keep_hydrogens: bool,

    /// Restrict the computation to these atom serial numbers:
    /// e.g. 1-200,305
    #[arg(short, long)]
    pub atoms: Option<String>,

    /// Number of threads to use for parallel processing (0 for all cores)
    #[arg(short = 'j', long = "num-threads", default_value_t = 0)]
    pub num_threads: usize,
}

/// Parse a comma-separated list of serial numbers and inclusive ranges.
pub(crate) fn parse_serials(selection: &str) -> Result<Vec<usize>, String> {
    let mut serials = Vec::new();
    for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: usize = start
                    .trim()
                    .parse()
                    .map_err(|e| format!("invalid range start in '{part}': {e}"))?;
                let end: usize = end
                    .trim()
                    .parse()
                    .map_err(|e| format!("invalid range end in '{part}': {e}"))?;
                if end < start {
                    return Err(format!("empty range '{part}'"));
                }
                serials.extend(start..=end);
            }
            None => serials.push(
                part.parse()
                    .map_err(|e| format!("invalid serial number '{part}': {e}"))?,
            ),
        }
    }
    if serials.is_empty() {
        return Err(format!("no serial numbers in '{selection}'"));
    }
    Ok(serials)
}

/// Load the input structure and compute its surface.
///
/// Failures are logged and yield `None`. On success the output directory exists.
pub(crate) fn compute_surface(
    args: &SurfaceArgs,
) -> Option<(Vec<AtomRecord>, SesSurface, PathBuf)> {
    trace!("{args:?}");

    // Make sure `input` exists
    let input_path = match Path::new(&args.input).canonicalize() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to retrieve input file: {}", e);
            return None;
        }
    };
    let output_path = match std::path::absolute(&args.output) {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to resolve the output directory: {}", e);
            return None;
        }
    };

    let serials = match args.atoms.as_deref().map(parse_serials).transpose() {
        Ok(serials) => serials,
        Err(e) => {
            error!("Failed to parse the atom selection: {e}");
            return None;
        }
    };

    // Load file as complex structure
    let (pdb, pdb_warnings) = match load_model(&input_path.to_string_lossy()) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            return None;
        }
    };
    for e in &pdb_warnings {
        match e.level() {
            pdbtbx::ErrorLevel::BreakingError => error!("{e}"),
            pdbtbx::ErrorLevel::InvalidatingError => error!("{e}"),
            _ => warn!("{e}"),
        }
    }

    let settings = Settings::with_probe_radius(args.probe_radius);
    let result = run_with_threads(args.num_threads, || {
        debug!("Using {} thread(s)", rayon::current_num_threads());
        get_surface(
            &pdb,
            args.model,
            args.keep_hydrogens,
            &settings,
            serials.as_deref(),
        )
    });
    let (records, surface) = match result {
        Ok(computed) => computed,
        Err(e) => {
            error!("Surface computation failed: {e}");
            return None;
        }
    };

    // Prepare output directory
    if let Err(e) = std::fs::create_dir_all(&output_path) {
        error!("Failed to create the output directory: {e}");
        return None;
    }
    Some((records, surface, output_path))
}
