use super::{compute_surface, SurfaceArgs};
use clap::Parser;
use sesurf::{surface_atoms_to_df, write_df_to_file};
use tracing::{debug, error, info};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    #[command(flatten)]
    surface: SurfaceArgs,

    /// Name of the output file
    #[arg(short = 'f', long = "filename", default_value_t = String::from("surface_atoms"))]
    filename: String,
}

pub(crate) fn run(args: &Args) {
    let Some((records, surface, output_path)) = compute_surface(&args.surface) else {
        return;
    };

    let diagnostics = &surface.surface_atoms.diagnostics;
    if diagnostics.total() > 0 {
        debug!("Skipped degenerate atom pairs: {diagnostics:?}");
    }

    let mut df = match surface_atoms_to_df(&records, &surface.surface_atoms) {
        Ok(df) => df,
        Err(e) => {
            error!("Failed to tabulate the surface atoms: {e}");
            return;
        }
    };
    info!(
        "Found {} surface atoms out of {}",
        surface.surface_atoms.count(),
        records.len()
    );

    let output_file = output_path
        .join(&args.filename)
        .with_extension(args.surface.output_format.to_string());
    match write_df_to_file(&mut df, &output_file, args.surface.output_format) {
        Ok(()) => info!("Results saved to {}", output_file.display()),
        Err(e) => error!("Failed to write {}: {e}", output_file.display()),
    }
}
