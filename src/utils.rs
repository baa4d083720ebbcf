use crate::atoms::{Atom, AtomFilter};
use crate::error::SesError;
use pdbtbx::*;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Van der Waals radius for atoms whose element has no tabulated value
const FALLBACK_VDW_RADIUS: f64 = 1.5;

/// Open an atomic data file with [`pdbtbx::ReadOptions`], keeping only atomic coordinates.
pub fn load_model(input_file: &str) -> Result<(PDB, Vec<PDBError>), SesError> {
    pdbtbx::ReadOptions::default()
        .set_only_atomic_coords(true)
        .set_level(pdbtbx::StrictnessLevel::Loose)
        .read(input_file)
        .map_err(|errors| {
            SesError::Load(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })
}

/// Structure annotations of one extracted atom.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub model: usize,
    pub chain: String,
    pub resn: String,
    pub resi: isize,
    pub insertion: String,
    pub altloc: String,
    pub atomn: String,
    pub atomi: usize,
}

impl AtomRecord {
    fn from_hier(hier: &AtomConformerResidueChainModel) -> Self {
        let (resi, insertion) = hier.residue().id();
        Self {
            model: hier.model().serial_number(),
            chain: hier.chain().id().to_string(),
            resn: hier.residue().name().unwrap_or("UNK").to_string(),
            resi,
            insertion: insertion.unwrap_or("").to_string(),
            altloc: hier.conformer().alternative_location().unwrap_or("").to_string(),
            atomn: hier.atom().name().to_string(),
            atomi: hier.atom().serial_number(),
        }
    }
}

/// Resolve a user-facing model number, where 0 means the first model.
pub fn resolve_model(pdb: &PDB, model_num: usize) -> usize {
    if model_num == 0 {
        pdb.models().next().map_or(0, |m| m.serial_number())
    } else {
        model_num
    }
}

/// Collect the atoms of one model as spheres with van der Waals radii.
///
/// Hydrogens are dropped unless `keep_hydrogens` is set. The returned records
/// line up index by index with the atoms.
pub fn atoms_from_pdb(
    pdb: &PDB,
    model_num: usize,
    keep_hydrogens: bool,
) -> Result<(Vec<Atom>, Vec<AtomRecord>), SesError> {
    let model_num = resolve_model(pdb, model_num);

    let (atoms, records): (Vec<Atom>, Vec<AtomRecord>) = pdb
        .atoms_with_hierarchy()
        .filter(|hier| hier.model().serial_number() == model_num)
        .filter(|hier| keep_hydrogens || hier.atom().element() != Some(&Element::H))
        .map(|hier| {
            let radius = hier
                .atom()
                .element()
                .and_then(|e| e.atomic_radius().van_der_waals)
                .unwrap_or(FALLBACK_VDW_RADIUS);
            let (x, y, z) = hier.atom().pos();
            (
                Atom::new(x as f32, y as f32, z as f32, radius as f32),
                AtomRecord::from_hier(&hier),
            )
        })
        .unzip();

    if atoms.is_empty() {
        return Err(SesError::Load(format!("model {model_num} contains no atoms")));
    }
    debug!("Extracted {} atoms from model {model_num}", atoms.len());
    Ok((atoms, records))
}

/// Filter that admits the atoms whose serial number is in `serials`.
///
/// Serials absent from `records` are reported and otherwise ignored.
pub fn filter_by_serials(
    records: &[AtomRecord],
    serials: &[usize],
) -> Result<AtomFilter, SesError> {
    let wanted: HashSet<usize> = serials.iter().copied().collect();
    let mask: Vec<bool> = records.iter().map(|r| wanted.contains(&r.atomi)).collect();

    let found: HashSet<usize> = records
        .iter()
        .filter(|r| wanted.contains(&r.atomi))
        .map(|r| r.atomi)
        .collect();
    if found.len() < wanted.len() {
        let mut missing: Vec<usize> = wanted.difference(&found).copied().collect();
        missing.sort_unstable();
        warn!("Atom serial numbers not found in the structure: {missing:?}");
    }

    AtomFilter::from_mask(mask, records.len())
}

/// Run `f` in a dedicated rayon pool with `num_threads` workers (0 for all cores).
///
/// Falls back to the global pool if the dedicated one cannot be built.
pub fn run_with_threads<T, F>(num_threads: usize, f: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
    {
        Ok(pool) => pool.install(f),
        Err(e) => {
            warn!("Failed to build a thread pool with {num_threads} thread(s): {e}");
            f()
        }
    }
}

/// Write a DataFrame to `file_path` in the requested format.
///
/// The file extension is replaced to match `file_type`.
pub fn write_df_to_file(
    df: &mut DataFrame,
    file_path: &Path,
    file_type: DataFrameFileType,
) -> PolarsResult<()> {
    let file_suffix = file_type.to_string();
    let mut file = std::fs::File::create(file_path.with_extension(file_suffix))?;
    match file_type {
        DataFrameFileType::Csv => CsvWriter::new(&mut file).finish(df),
        DataFrameFileType::Parquet => ParquetWriter::new(&mut file).finish(df).map(|_| ()),
        DataFrameFileType::Json => JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::Json)
            .finish(df),
        DataFrameFileType::NDJson => JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::JsonLines)
            .finish(df),
    }
}

/// File format for writing DataFrames.
#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum DataFrameFileType {
    /// Comma-separated values
    Csv,
    /// Parquet columnar storage
    Parquet,
    /// Standard JSON
    Json,
    /// Newline-delimited JSON
    NDJson,
}

impl std::fmt::Display for DataFrameFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataFrameFileType::Csv => write!(f, "csv"),
            DataFrameFileType::Parquet => write!(f, "parquet"),
            DataFrameFileType::Json => write!(f, "json"),
            DataFrameFileType::NDJson => write!(f, "ndjson"),
        }
    }
}
