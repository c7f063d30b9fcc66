//! mdec - metadata tagging toolkit for a personal file archive.
//!
//! Usage:
//!   mdec inspect [PATH]        Find duplicate content, oldest copy first
//!   mdec score FILE            Grade a file's metadata quality
//!   mdec validate PATH         Check (and with --fix, repair) metadata
//!   mdec mint --name ...       Mint a Signet and M-ID, bind it to the ledger
//!   mdec stamp FILE            Emit an engram sidecar for an asset
//!   mdec ingest MANIFEST       Commit an ingestion manifest to the ledger
//!   mdec --help                Show help

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use mdec_analyze::{
    AutoValidator, DuplicateConfig, DuplicateFinder, QualityScorer, render_duplicates,
    render_quality, render_validation,
};
use mdec_core::{Category, DigestKind, InspectConfig, Settings};
use mdec_ledger::{
    Binding, Faktory, FaktoryConfig, Ledger, LedgerRecord, SignetComponents, StampRequest,
    ingest_manifest,
};
use mdec_scan::Walker;

/// Exit code when a quality score is below the acceptance bar.
const EXIT_BELOW_BAR: u8 = 2;

#[derive(Parser)]
#[command(
    name = "mdec",
    version,
    about = "Metadata tagging toolkit: duplicate provenance, quality scoring, M-ID minting",
    long_about = "mdec inspects an archive for duplicate content, grades and repairs \
                  metadata, mints deterministic identifiers into an append-only ledger \
                  and stamps assets with engram sidecars."
)]
struct Cli {
    /// Settings file (defaults to <config dir>/mdec/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find duplicate files and rank each group oldest first
    Inspect {
        /// Directory or .zip archive to inspect (defaults to the workspace root setting)
        path: Option<PathBuf>,

        /// Category code to inspect (01-09, 99), or "all"
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Also walk zip archives found in the tree
        #[arg(short = 'z', long)]
        scan_archives: bool,

        /// Only list content that exists more than once
        #[arg(short, long)]
        duplicates_only: bool,

        /// Maximum number of groups to list
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Digest used to fingerprint content
        #[arg(long, default_value = "sha256")]
        digest: DigestArg,

        /// Hashing threads (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Grade a file's metadata quality (exit 2 when below 75)
    Score {
        /// File to score
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate metadata in a file or directory
    Validate {
        /// File or directory to validate
        path: PathBuf,

        /// Repair fixable violations (originals are backed up first)
        #[arg(long)]
        fix: bool,

        /// Re-run every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Mint a Signet and M-ID and bind it to the ledger
    Mint {
        /// Creator name
        #[arg(long)]
        name: String,

        /// Date of birth (YYYY-MM-DD, MM-DD-YYYY, MM/DD/YYYY or YYYY/MM/DD)
        #[arg(long)]
        dob: String,

        /// Active epoch, e.g. "20xx"
        #[arg(long)]
        epoch: String,

        /// Comma-separated vocations
        #[arg(long)]
        vocation: String,

        /// Country or continent of origin
        #[arg(long)]
        origin: String,

        /// Ledger file (defaults to the ledger_path setting)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Hash, score and certify an asset, writing <asset>.engram.json
    Stamp {
        /// Asset to stamp
        file: PathBuf,

        /// Engram category (unrecognized values become "unassigned")
        #[arg(short, long)]
        category: Option<String>,

        /// Context note recorded in the engram
        #[arg(long)]
        context: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Related asset to link (repeatable)
        #[arg(short, long = "link")]
        links: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Commit an ingestion manifest to the ledger
    Ingest {
        /// Manifest file
        manifest: PathBuf,

        /// Ledger file (defaults to the ledger_path setting)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DigestArg {
    Sha256,
    Blake3,
}

impl From<DigestArg> for DigestKind {
    fn from(arg: DigestArg) -> Self {
        match arg {
            DigestArg::Sha256 => DigestKind::Sha256,
            DigestArg::Blake3 => DigestKind::Blake3,
        }
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mdec=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Command::Inspect {
            path,
            category,
            scan_archives,
            duplicates_only,
            limit,
            digest,
            threads,
            format,
        } => {
            let path = path.unwrap_or_else(|| settings.workspace_root.clone());
            let options = InspectOptions {
                category: parse_category(&category),
                scan_archives,
                duplicates_only,
                limit: limit.unwrap_or(settings.report_limit),
                digest: digest.into(),
                threads,
            };
            run_inspect(&path, &settings, options, format)
        }
        Command::Score { file, format } => run_score(&file, format),
        Command::Validate {
            path,
            fix,
            watch,
            format,
        } => run_validate(&path, fix, watch, format),
        Command::Mint {
            name,
            dob,
            epoch,
            vocation,
            origin,
            ledger,
            format,
        } => {
            let components = SignetComponents {
                name,
                dob,
                epoch,
                vocation,
                origin,
            };
            let ledger = ledger.unwrap_or_else(|| settings.ledger_path.clone());
            run_mint(components, &ledger, format)
        }
        Command::Stamp {
            file,
            category,
            context,
            tags,
            links,
            format,
        } => {
            let request = StampRequest {
                category,
                context,
                tags,
                neural_links: links,
            };
            run_stamp(&file, &settings, &request, format)
        }
        Command::Ingest {
            manifest,
            ledger,
            format,
        } => {
            let ledger = ledger.unwrap_or_else(|| settings.ledger_path.clone());
            run_ingest(&manifest, &ledger, format)
        }
    }
}

/// `all` selects every category; an unknown code falls back to 09.
fn parse_category(code: &str) -> Option<Category> {
    if code.eq_ignore_ascii_case("all") {
        return None;
    }
    match Category::from_code(code) {
        Ok(category) => Some(category),
        Err(err) => {
            warn!(error = %err, "Defaulting to 09 (Uncategorized)");
            Some(Category::Uncategorized)
        }
    }
}

struct InspectOptions {
    category: Option<Category>,
    scan_archives: bool,
    duplicates_only: bool,
    limit: usize,
    digest: DigestKind,
    threads: usize,
}

/// Walk, group and report duplicates.
fn run_inspect(
    path: &Path,
    settings: &Settings,
    options: InspectOptions,
    format: OutputFormat,
) -> Result<ExitCode> {
    let path = path.canonicalize().context("Invalid path")?;
    let filter = options
        .category
        .map(|c| format!("[{}] {}", c.code(), c))
        .unwrap_or_else(|| "ALL".to_string());
    info!(root = %path.display(), category = %filter, "Inspecting");

    let config = InspectConfig::builder()
        .root(&path)
        .category(options.category)
        .skip_dirs(settings.skip_dirs.clone())
        .scan_archives(options.scan_archives)
        .digest(options.digest)
        .threads(options.threads)
        .build()
        .context("Invalid inspect configuration")?;

    let walker = Walker::new();
    let mut progress_rx = walker.subscribe();
    let progress = std::thread::spawn(move || {
        while let Ok(progress) = progress_rx.blocking_recv() {
            info!(files = progress.files_seen, hashed = progress.files_hashed, "Scanning");
        }
    });
    let inventory = walker.walk(&config).context("Inspection failed")?;
    drop(walker);
    let _ = progress.join();

    info!(
        files = inventory.len(),
        warnings = inventory.warnings.len(),
        seconds = inventory.scan_duration.as_secs_f64(),
        "Walk complete"
    );
    for warning in &inventory.warnings {
        warn!(path = %warning.path.display(), "{}", warning.message);
    }

    let duplicate_config = DuplicateConfig::builder()
        .duplicates_only(options.duplicates_only)
        .build()
        .context("Invalid duplicate configuration")?;
    let report = DuplicateFinder::with_config(duplicate_config).find_duplicates(&inventory);

    match format {
        OutputFormat::Text => println!("{}", render_duplicates(&report, options.limit)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(ExitCode::SUCCESS)
}

/// Score one file. Exit 0 when passing, 2 below the bar.
fn run_score(file: &Path, format: OutputFormat) -> Result<ExitCode> {
    let report = QualityScorer::new()
        .score_file(file)
        .with_context(|| format!("Failed to score {}", file.display()))?;

    match format {
        OutputFormat::Text => println!("{}", render_quality(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(if report.grade.is_passing() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_BELOW_BAR)
    })
}

/// Validate once, or repeatedly in watch mode.
fn run_validate(
    path: &Path,
    fix: bool,
    watch: Option<u64>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let validator = AutoValidator::new(fix);

    let Some(interval) = watch else {
        let report = validator.validate_path(path).context("Validation failed")?;
        print_validation(&report, format)?;
        return Ok(if report.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    };

    info!(path = %path.display(), interval, "Watching for metadata changes");
    loop {
        let report = validator.validate_path(path).context("Validation failed")?;
        print_validation(&report, format)?;
        std::thread::sleep(Duration::from_secs(interval.max(1)));
    }
}

fn print_validation(report: &mdec_analyze::ValidationReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", render_validation(report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

/// Mint a Signet, derive its M-ID and bind it.
fn run_mint(components: SignetComponents, ledger_path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let signet = components.mint().context("Failed to mint Signet")?;
    let mid = signet.mid().to_string();

    let mut ledger = Ledger::open(ledger_path).context("Failed to open ledger")?;
    let binding = ledger.bind(&mid, LedgerRecord::minted(&signet, components));
    if binding == Binding::Bound {
        ledger.save().context("Failed to save ledger")?;
    }

    match format {
        OutputFormat::Text => {
            println!("M-ID (immutable key):     {mid}");
            println!("SIGNET (human readable):  {signet}");
            match &binding {
                Binding::Bound => {
                    println!("Bound to ledger: {}", ledger_path.display());
                }
                Binding::AlreadyBound { existing_signet } => {
                    println!(
                        "Already registered to: {}",
                        existing_signet.as_deref().unwrap_or("(no signet)")
                    );
                }
            }
        }
        OutputFormat::Json => {
            let (bound, existing) = match &binding {
                Binding::Bound => (true, None),
                Binding::AlreadyBound { existing_signet } => (false, existing_signet.clone()),
            };
            let out = json!({
                "m_id": mid,
                "signet": signet,
                "bound": bound,
                "existing_signet": existing,
                "ledger": ledger_path,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Run the Faktory pipeline on one asset.
fn run_stamp(
    file: &Path,
    settings: &Settings,
    request: &StampRequest,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut builder = FaktoryConfig::builder();
    builder.org_name(settings.org_name.clone());
    if let Some(vault) = &settings.vault_path {
        builder.origin_vault(vault.display().to_string());
    }
    let config = builder.build().context("Invalid faktory configuration")?;

    let (engram, sidecar) = Faktory::with_config(config)
        .stamp(file, request)
        .with_context(|| format!("Faktory pipeline failed for {}", file.display()))?;

    match format {
        OutputFormat::Text => {
            println!("Engram emitted: {}", sidecar.display());
            println!("  Category:      {} ({})", engram.category, engram.mdec_category);
            println!("  Checksum:      {}", engram.checksum);
            println!("  Quality:       {}/100", engram.quality_score);
            println!("  Certification: {}", engram.certification);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&engram)?),
    }

    Ok(ExitCode::SUCCESS)
}

/// Commit a manifest to the ledger.
fn run_ingest(manifest: &Path, ledger_path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let mut ledger = Ledger::open(ledger_path).context("Failed to open ledger")?;
    let committed = ingest_manifest(manifest, &mut ledger)
        .with_context(|| format!("Failed to ingest {}", manifest.display()))?;

    match format {
        OutputFormat::Text => {
            for item in &committed {
                println!(
                    "[+] LEDGER UPDATE: {} -> {}",
                    item.mid.as_deref().unwrap_or_default(),
                    item.file_name.as_deref().unwrap_or("N/A")
                );
            }
            println!("Ledger updated. {} new entries committed.", committed.len());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&committed)?),
    }

    Ok(ExitCode::SUCCESS)
}
