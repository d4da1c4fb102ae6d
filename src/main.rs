use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use siteskill_core::config::AnalysisConfig;
use siteskill_core::describe::NoopDescriber;
use siteskill_core::{analyze_exchanges, analyze_har, build_skill};

/// Exit code for runtime errors (pipeline or I/O failures).
const EXIT_RUNTIME_ERROR: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "siteskill", version, about = "Turns captured HTTP traffic into an agent-consumable API skill")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a HAR file and print the derived API description as JSON.
    Analyze {
        /// Path to a HAR document (.har).
        har: PathBuf,

        /// Path to an `AnalysisConfig` JSON file. Defaults used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,

        /// Print the enriched `ApiData` instead of the `AgenticAnalysis`
        /// document (spec §6 names the latter as the external analysis
        /// artifact; this is for inspecting the former directly).
        #[arg(long)]
        api_data: bool,
    },

    /// Analyze a HAR file and write (or merge into) a skill package.
    BuildSkill {
        /// Path to a HAR document (.har).
        har: PathBuf,

        /// Directory the skill package is written to. Defaults to
        /// `~/.siteskill`.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Path to an `AnalysisConfig` JSON file. Defaults used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Default root the skill package tree is written under when `--out` is
/// omitted, mirroring the teacher's `~/.harharhar` data directory.
fn default_out_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("no home directory available; pass --out explicitly")?
        .join(".siteskill"))
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("siteskill=debug")
    } else {
        EnvFilter::new("siteskill=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Analyze {
            har,
            config,
            pretty,
            api_data,
        } => cmd_analyze(&har, config.as_deref(), pretty, api_data),
        Commands::BuildSkill { har, out, config } => {
            let out = match out {
                Some(out) => Ok(out),
                None => default_out_dir(),
            };
            out.and_then(|out| cmd_build_skill(&har, &out, config.as_deref()))
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(EXIT_RUNTIME_ERROR);
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<AnalysisConfig> {
    match path {
        None => Ok(AnalysisConfig::default()),
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))
        }
    }
}

fn cmd_analyze(
    har: &std::path::Path,
    config: Option<&std::path::Path>,
    pretty: bool,
    want_api_data: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let bytes = fs::read(har).with_context(|| format!("reading HAR file {}", har.display()))?;
    let output = analyze_har(&bytes, &config).context("analyzing captured traffic")?;

    for warning in &output.warnings {
        tracing::warn!(%warning, "analysis warning");
    }

    // spec §6 "Analysis output" names the AgenticAnalysis shape as the
    // external analysis artifact; `--api-data` is an escape hatch onto the
    // enriched ApiData it was derived from.
    let rendered = if want_api_data {
        if pretty {
            serde_json::to_string_pretty(&output.api_data)?
        } else {
            serde_json::to_string(&output.api_data)?
        }
    } else if pretty {
        serde_json::to_string_pretty(&output.analysis)?
    } else {
        serde_json::to_string(&output.analysis)?
    };
    println!("{rendered}");
    tracing::info!(
        endpoints = output.api_data.endpoint_groups.len(),
        entities = output.analysis.entities.len(),
        "analysis complete"
    );
    Ok(())
}

fn cmd_build_skill(
    har: &std::path::Path,
    out: &std::path::Path,
    config: Option<&std::path::Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let bytes = fs::read(har).with_context(|| format!("reading HAR file {}", har.display()))?;
    let exchanges = siteskill_core::har::decode_har(&bytes).context("decoding HAR file")?;
    let analysis = analyze_exchanges(&exchanges, &config, &[], &[], &NoopDescriber, None)
        .context("analyzing captured traffic")?;

    for warning in &analysis.warnings {
        tracing::warn!(%warning, "analysis warning");
    }

    let (package, build_warnings) =
        build_skill(&analysis.api_data, out).context("building skill package")?;
    for warning in &build_warnings {
        tracing::warn!(%warning, "skill package warning");
    }
    siteskill_core::skill::write_package(out, &analysis.api_data.service, &package)
        .with_context(|| format!("writing skill package to {}", out.display()))?;

    println!("wrote skill package to {} ({})", out.display(), package.version_hash);
    if let Some(diff) = &package.diff {
        println!("{diff}");
    }
    Ok(())
}
