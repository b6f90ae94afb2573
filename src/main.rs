//! Command-line front end for the transparency rewrite.
//!
//! Usage:
//!   lucent deck.pptx -o deck-clear.pptx
//!   lucent a.pptx b.pptx -o out/
//!   lucent --in-place --synthesize-backgrounds *.pptx

use clap::{ArgAction, Parser};
use lucent::{RewriteConfig, RewriteReport};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lucent",
    about = "Make PowerPoint slide backgrounds, shape fills and pictures transparent",
    version
)]
struct Args {
    /// Input presentation files (.pptx, .pptm, .potx, .ppsx, ...)
    #[arg(value_name = "INPUT", required = true)]
    input: Vec<PathBuf>,

    /// Output file, or output directory when several inputs are given
    #[arg(short, long, value_name = "PATH", conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Overwrite each input file with its rewritten version
    #[arg(long)]
    in_place: bool,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Add a transparent background to parts that declare none
    #[arg(long)]
    synthesize_backgrounds: bool,

    /// Remove image parts left unreferenced after the rewrite
    #[arg(long)]
    prune_media: bool,

    /// Replace existing output files
    #[arg(short, long)]
    force: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    fn rewrite_config(&self) -> Result<RewriteConfig, lucent::ConfigError> {
        let mut config = match &self.config {
            Some(path) => RewriteConfig::load(path)?,
            None => RewriteConfig::default(),
        };
        if self.synthesize_backgrounds {
            config = config.with_missing_background(lucent::BackgroundPolicy::Synthesize);
        }
        if self.prune_media {
            config = config.with_prune_orphaned_media(true);
        }
        Ok(config)
    }

    /// Pair every input with the path its rewrite is written to.
    fn jobs(&self) -> Result<Vec<(PathBuf, PathBuf)>, String> {
        if self.in_place {
            return Ok(self.input.iter().map(|p| (p.clone(), p.clone())).collect());
        }

        let Some(output) = &self.output else {
            return Err("either --output or --in-place is required".to_string());
        };

        let output_is_dir = output.to_string_lossy().ends_with(['/', '\\']) || output.is_dir();
        if self.input.len() > 1 && !output_is_dir {
            return Err("multiple input files require --output to be a directory".to_string());
        }

        if !output_is_dir {
            return Ok(vec![(self.input[0].clone(), output.clone())]);
        }

        self.input
            .iter()
            .map(|input| {
                let name = input
                    .file_name()
                    .ok_or_else(|| format!("input has no file name: {}", input.display()))?;
                Ok((input.clone(), output.join(name)))
            })
            .collect()
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lucent={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn process(input: &Path, output: &Path, config: &RewriteConfig, force: bool) -> Result<RewriteReport, String> {
    if !input.is_file() {
        return Err(format!("input is not a file: {}", input.display()));
    }
    if input != output && output.exists() && !force {
        return Err(format!("output exists (use --force to replace): {}", output.display()));
    }
    lucent::make_transparent(input, output, config).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level());

    let config = match args.rewrite_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    let jobs = match args.jobs() {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    let failures = jobs
        .par_iter()
        .filter(|(input, output)| match process(input, output, &config, args.force) {
            Ok(report) => {
                info!(
                    input = %input.display(),
                    output = %output.display(),
                    backgrounds = report.backgrounds_replaced + report.backgrounds_synthesized,
                    fills = report.fills_replaced,
                    pictures = report.pictures_removed,
                    "done"
                );
                false
            },
            Err(e) => {
                error!(input = %input.display(), "{}", e);
                true
            },
        })
        .count();

    if failures > 0 {
        error!("{} of {} files failed", failures, jobs.len());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
