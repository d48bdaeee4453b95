mod logging;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geofloor_geo::{
    build_matrix, BuildSettings, CountryDictionary, CountryDistanceMatrix, CountryRecord,
    FeatureCollection,
};
use geofloor_model::{CountryDistanceFile, ReportFile, TraceFile};
use geofloor_validate::{validate_runs, GapPolicy, ValidatorSettings};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const REPORT_FILE_VERSION: u32 = 1;

#[derive(Parser)]
#[command(
    name = "geofloor",
    version,
    about = "Speed-of-light floor test for traceroute hop geolocations"
)]
struct Cli {
    #[command(flatten)]
    logging: logging::Params,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    BuildMatrix(BuildMatrixArgs),
    Validate(ValidateArgs),
}

#[derive(Args)]
#[command(about = "Build the country-to-country minimum distance matrix from boundary polygons")]
struct BuildMatrixArgs {
    /// GeoJSON FeatureCollection of country boundaries.
    #[arg(long)]
    boundaries: PathBuf,

    /// JSON list of `{code, name, official_name?, aliases?}` records.
    #[arg(long)]
    countries: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 0)]
    threads: usize,

    #[arg(long, default_value_t = 1000)]
    progress_every: usize,
}

#[derive(Args)]
#[command(about = "Check consecutive hops of each traceroute against the RTT distance bound")]
struct ValidateArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long)]
    matrix: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = GapPolicyArg::Keep)]
    gap_policy: GapPolicyArg,

    #[arg(long, default_value_t = 0)]
    threads: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum GapPolicyArg {
    /// Incomplete or unlocatable hops are skipped; the baseline stays.
    Keep,
    /// Incomplete or unlocatable hops drop the baseline.
    Reset,
}

impl From<GapPolicyArg> for GapPolicy {
    fn from(arg: GapPolicyArg) -> Self {
        match arg {
            GapPolicyArg::Keep => GapPolicy::KeepBaseline,
            GapPolicyArg::Reset => GapPolicy::ResetBaseline,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let logger = logging::configure_from(&cli.logging)?;

    let result = match cli.command {
        Commands::BuildMatrix(args) => run_build_matrix(args),
        Commands::Validate(args) => run_validate(args),
    };

    logger.flush();
    result
}

fn run_build_matrix(args: BuildMatrixArgs) -> Result<()> {
    let collection: FeatureCollection = read_json(&args.boundaries, "boundaries")?;
    let records: Vec<CountryRecord> = read_json(&args.countries, "country dictionary")?;
    let dictionary = CountryDictionary::from_records(&records);
    if dictionary.is_empty() {
        return Err(anyhow!(
            "country dictionary {:?} has no entries",
            args.countries
        ));
    }
    info!(
        "loaded {} boundary features, {} dictionary countries",
        collection.features.len(),
        dictionary.len()
    );

    let settings = BuildSettings {
        threads: args.threads,
        progress_every: args.progress_every,
    };
    let build = build_matrix(&collection, &dictionary, &settings)
        .context("failed to build distance matrix")?;

    if build.matrix.is_empty() {
        warn!("matrix is empty; fewer than two countries reconciled");
    }

    let generated_at_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let file = build.matrix.to_file(generated_at_utc, build.excluded);
    write_json(&args.out, &file)?;
    info!(
        "wrote {} entries for {} countries to {:?}",
        file.entries.len(),
        build.countries.len(),
        args.out
    );
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let traces: TraceFile = read_json(&args.in_path, "traces")?;
    let matrix_file: CountryDistanceFile = read_json(&args.matrix, "distance matrix")?;
    let matrix = CountryDistanceMatrix::from_file(&matrix_file);
    if matrix.is_empty() {
        warn!(
            "distance matrix {:?} is empty; only coordinate and same-country comparisons are possible",
            args.matrix
        );
    }

    let settings = ValidatorSettings {
        gap_policy: args.gap_policy.into(),
        threads: args.threads,
    };
    let reports = validate_runs(&traces.runs, &matrix, &settings)
        .context("failed to validate traceroutes")?;

    let violations: u32 = reports.iter().map(|r| r.report.summary.violations).sum();
    let verdicts: u32 = reports.iter().map(|r| r.report.summary.verdicts).sum();
    info!(
        "{} traceroutes, {} verdicts, {} outside radius",
        reports.len(),
        verdicts,
        violations
    );

    let report_file = ReportFile {
        version: REPORT_FILE_VERSION,
        reports,
    };
    write_json(&args.out, &report_file)
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} {path:?}"))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {what} {path:?}"))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &json)
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {parent:?}"))?;
    }

    let tmp_path = temp_path(path);
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create temp file {tmp_path:?}"))?;
    file.write_all(data)
        .with_context(|| format!("failed to write temp file {tmp_path:?}"))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file {tmp_path:?}"))?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(anyhow!("failed to replace output {:?}: {}", path, err));
    }

    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("output");
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    parent.join(format!(".{}.part-{}-{}", file_name, std::process::id(), stamp))
}
