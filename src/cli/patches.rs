use super::{compute_surface, SurfaceArgs};
use clap::Parser;
use polars::prelude::*;
use sesurf::{
    sphere_patches_to_df, toroidal_patches_to_df, write_df_to_file, DataFrameFileType, Diagnostics,
};
use std::path::Path;
use tracing::{debug, error, info};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    #[command(flatten)]
    surface: SurfaceArgs,
}

pub(crate) fn run(args: &Args) {
    let Some((records, surface, output_path)) = compute_surface(&args.surface) else {
        return;
    };

    report_skipped("spherical", &surface.sphere_patches.diagnostics);
    report_skipped("toroidal", &surface.toroidal_patches.diagnostics);

    let tables = [
        (
            "sphere_patches",
            sphere_patches_to_df(&records, &surface.sphere_patches),
        ),
        (
            "toroidal_patches",
            toroidal_patches_to_df(&records, &surface.toroidal_patches),
        ),
    ];
    for (name, df) in tables {
        match df {
            Ok(mut df) => {
                info!("Found {} {name}", df.height());
                save(&mut df, &output_path, name, args.surface.output_format);
            }
            Err(e) => error!("Failed to tabulate {name}: {e}"),
        }
    }
}

fn report_skipped(kind: &str, diagnostics: &Diagnostics) {
    if diagnostics.total() > 0 {
        debug!(
            "Skipped {} {kind} patch candidates without a probe placement: {diagnostics:?}",
            diagnostics.total()
        );
    }
}

fn save(df: &mut DataFrame, output_path: &Path, name: &str, format: DataFrameFileType) {
    let output_file = output_path.join(name).with_extension(format.to_string());
    match write_df_to_file(df, &output_file, format) {
        Ok(()) => info!("Results saved to {}", output_file.display()),
        Err(e) => error!("Failed to write {}: {e}", output_file.display()),
    }
}
