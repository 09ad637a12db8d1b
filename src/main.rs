use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use organ_stops::config::Settings;
use organ_stops::site::SiteLayout;
use organ_stops::{convert, parser, site};

#[derive(Parser)]
#[command(name = "organ_stops", about = "Legacy organ stop encyclopedia converter and site builder")]
struct Cli {
    /// Operator settings file layered over the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert legacy HTML pages into JSON records
    Convert {
        /// Root of the legacy <letter>/<Name>.html tree
        old_directory: PathBuf,
        /// Root of the <letter>/<Name>.json record tree
        new_directory: PathBuf,
        /// Convert every document, not just the ones without a record
        #[arg(short, long)]
        rewrite: bool,
        /// Parse everything but write nothing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Extract a single legacy page and print its record
    Parse {
        file: PathBuf,
    },
    /// Render the static site from the record tree
    Build {
        /// Root of the record tree
        #[arg(short, long, default_value = "definitions")]
        definitions: PathBuf,
        /// Output directory, cleared before every build
        #[arg(short, long, default_value = "build")]
        site: PathBuf,
        /// Directory holding images/ and audio/
        #[arg(short, long, default_value = ".")]
        assets: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let settings = Settings::load(cli.config.as_deref())?;

    let code = match cli.command {
        Commands::Convert {
            old_directory,
            new_directory,
            rewrite,
            dry_run,
        } => {
            let report = convert::convert_all(&old_directory, &new_directory, rewrite, dry_run, &settings)?;
            if report.selected == 0 {
                println!("Nothing to convert. Use --rewrite to convert every document again.");
            }
            report.print();
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Parse { file } => {
            let record = parser::parse_file(&file, &settings.clip_labels())?;
            let json = serde_json::to_string_pretty(&record).context("Failed to serialize record")?;
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Commands::Build {
            definitions,
            site: site_root,
            assets,
        } => {
            let layout = SiteLayout {
                definitions,
                site_root,
                assets,
            };
            site::build_site(&layout)?.print();
            ExitCode::SUCCESS
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    Ok(code)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}
