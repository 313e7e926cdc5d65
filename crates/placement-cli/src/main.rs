//! placement CLI: score recorded submissions and export assessment reports.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use placement_core::report::AttemptFilter;
use placement_core::scoring::GradeBand;

mod commands;

#[derive(Parser)]
#[command(
    name = "placement",
    version,
    about = "Placement assessment scoring and reporting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score recorded submissions against an assessment
    Score {
        /// Path to the assessment .toml file
        #[arg(long)]
        assessment: PathBuf,

        /// Path to the submissions JSON file
        #[arg(long)]
        submissions: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, csv, detailed, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Skip RAG sync and result emails
        #[arg(long)]
        no_notify: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export a saved report as CSV or HTML
    Export {
        /// Report JSON produced by `placement score`
        #[arg(long)]
        report: PathBuf,

        /// Assessment .toml file (required for CSV formats)
        #[arg(long)]
        assessment: Option<PathBuf>,

        /// Output format: csv, detailed, html, all
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output directory
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Print statistics from a saved report
    Stats {
        /// Report JSON produced by `placement score`
        #[arg(long)]
        report: PathBuf,

        /// List only attempts in this grade band (A, B, C, D, F)
        #[arg(long)]
        grade: Option<GradeBand>,

        /// List only attempts whose student name or email contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Validate assessment TOML files
    Validate {
        /// Path to an assessment file or directory
        #[arg(long)]
        assessments: PathBuf,
    },

    /// Ask the RAG service to rebuild its knowledge base
    Sync {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example assessment
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "placement=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            assessment,
            submissions,
            output,
            format,
            no_notify,
            config,
        } => {
            commands::score::execute(assessment, submissions, output, format, no_notify, config)
                .await
        }
        Commands::Export {
            report,
            assessment,
            format,
            output,
        } => commands::export::execute(report, assessment, format, output),
        Commands::Stats {
            report,
            grade,
            search,
        } => commands::stats::execute(report, AttemptFilter { search, grade }),
        Commands::Validate { assessments } => commands::validate::execute(assessments),
        Commands::Sync { config } => commands::sync::execute(config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
